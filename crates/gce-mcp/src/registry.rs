//! Tool registry
//!
//! Name lookup and required-argument checks. Both happen before a handler is
//! invoked, so a bad call never reaches the provider.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::tools::{ToolDefinition, get_tool_definitions};
use crate::{Error, Result};

/// Static mapping from tool name to definition
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Registry holding every tool from [`get_tool_definitions`]
    pub fn new() -> Self {
        Self::from_definitions(get_tool_definitions())
    }

    pub fn from_definitions(definitions: Vec<ToolDefinition>) -> Self {
        let tools = definitions
            .into_iter()
            .map(|def| (def.name.clone(), def))
            .collect();
        Self { tools }
    }

    /// Look up a tool by exact name
    pub fn get(&self, name: &str) -> Result<&ToolDefinition> {
        self.tools
            .get(name)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))
    }

    /// All definitions, ordered by name
    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve `name` and check `arguments` against its schema's `required` list.
    ///
    /// `arguments` must be an object, or null when the tool requires nothing.
    pub fn validate(&self, name: &str, arguments: &Value) -> Result<&ToolDefinition> {
        let definition = self.get(name)?;
        let required = definition.required_arguments();

        let object = match arguments {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                return Err(Error::invalid_arguments(format!(
                    "arguments must be an object, got {}",
                    json_type(other)
                )));
            }
        };

        let missing: Vec<&str> = required
            .into_iter()
            .filter(|key| {
                object
                    .and_then(|map| map.get(*key))
                    .is_none_or(Value::is_null)
            })
            .collect();

        if !missing.is_empty() {
            return Err(Error::invalid_arguments(format!(
                "missing required argument{}: {}",
                if missing.len() == 1 { "" } else { "s" },
                missing.join(", ")
            )));
        }

        Ok(definition)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
