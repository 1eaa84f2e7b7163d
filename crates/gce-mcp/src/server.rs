//! MCP Server implementation
//!
//! [`GceMcpServer`] turns one JSON-RPC message into at most one response.
//! It holds no per-request state, so the SSE transport shares a single
//! instance across sessions.

use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::handlers::{ToolContext, handle_tool_call};
use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcRequest, JsonRpcResponse, ToolCallParams,
};
use crate::registry::ToolRegistry;
use crate::tools::{ToolDefinition, ToolResult};
use crate::{Error, Result};

/// Name reported in `serverInfo`
pub const SERVER_NAME: &str = "gce-mcp";

/// MCP Server for Google Compute Engine
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use gce_mcp::{GceMcpServer, ToolContext};
///
/// let ctx = ToolContext::new(Arc::new(client), "us-central1-a", "us-central1");
/// let mut server = GceMcpServer::new(ctx);
/// server.initialize().await?;
/// server.run_stdio().await?;
/// ```
pub struct GceMcpServer {
    context: ToolContext,
    registry: ToolRegistry,
    initialized: bool,
}

impl GceMcpServer {
    /// Create a new MCP server instance
    pub fn new(context: ToolContext) -> Self {
        Self {
            context,
            registry: ToolRegistry::from_definitions(Vec::new()),
            initialized: false,
        }
    }

    /// Load the tool registry and mark the server ready
    pub async fn initialize(&mut self) -> Result<()> {
        self.registry = ToolRegistry::new();
        self.initialized = true;

        tracing::info!(
            tools = self.registry.len(),
            zone = %self.context.default_zone,
            region = %self.context.default_region,
            "Initialized MCP server"
        );
        Ok(())
    }

    /// Serve newline-delimited JSON-RPC on stdin/stdout until stdin closes
    pub async fn run_stdio(&self) -> Result<()> {
        tracing::info!("MCP server ready, listening on stdio");
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        self.serve_lines(stdin, tokio::io::stdout()).await
    }

    /// Process messages one line at a time, writing one response line per request
    pub async fn serve_lines<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            tracing::debug!(request = %line, "Received message");

            let response = match self.handle_message(line).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to handle message");
                    Self::internal_error(&e)
                }
            };
            if !response.is_empty() {
                writer.write_all(response.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        tracing::info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle a single MCP message
    ///
    /// Returns the serialized JSON-RPC response, or an empty string for
    /// notifications. Protocol-level failures (bad JSON, unknown method,
    /// bad params) are encoded as JSON-RPC errors rather than returned as
    /// `Err`.
    pub async fn handle_message(&self, message: &str) -> Result<String> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }

        let raw: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable message");
                return encode(JsonRpcResponse::parse_error(e));
            }
        };

        let raw_id = raw.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(e) => return encode(JsonRpcResponse::invalid_request(raw_id, e)),
        };

        if !request.has_supported_version() {
            let detail = format!("unsupported jsonrpc version {}", request.jsonrpc);
            return encode(JsonRpcResponse::invalid_request(request.id, detail));
        }

        if request.is_notification() {
            tracing::debug!(method = %request.method, "Notification received");
            return Ok(String::new());
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id, request.params)?,
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await?,
            method => JsonRpcResponse::method_not_found(request.id, method),
        };

        encode(response)
    }

    fn handle_initialize(&self, id: Option<Value>, params: Value) -> Result<JsonRpcResponse> {
        let params: InitializeParams = serde_json::from_value(params).unwrap_or_default();
        if let Some(client) = &params.client_info {
            tracing::info!(
                client = %client.name,
                client_version = %client.version,
                protocol_version = params.protocol_version.as_deref().unwrap_or("unspecified"),
                "Client connected"
            );
        }

        let result = InitializeResult::tools_only(SERVER_NAME, env!("CARGO_PKG_VERSION"));
        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let tools: Vec<&ToolDefinition> = self.registry.definitions().collect();
        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    /// Execute a tool.
    ///
    /// Invocation errors are JSON-RPC `-32602` errors raised before any
    /// provider call. Provider errors come back as a tool result with
    /// `isError` set and the provider's message unchanged.
    async fn handle_tools_call(&self, id: Option<Value>, params: Value) -> Result<JsonRpcResponse> {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                return Ok(JsonRpcResponse::invalid_params(
                    id,
                    format!("Invalid params: {}", e),
                ));
            }
        };

        if let Err(e) = self.registry.validate(&params.name, &params.arguments) {
            tracing::warn!(tool = %params.name, error = %e, "Rejected tool call");
            return Ok(JsonRpcResponse::invalid_params(id, e.to_string()));
        }

        tracing::info!(tool = %params.name, "Calling tool");
        let tool_result = match handle_tool_call(&self.context, &params.name, params.arguments).await {
            Ok(result) => ToolResult::text(serde_json::to_string_pretty(&result)?),
            Err(e) if e.is_invocation_error() => {
                tracing::warn!(tool = %params.name, error = %e, "Rejected tool call");
                return Ok(JsonRpcResponse::invalid_params(id, e.to_string()));
            }
            Err(e) => {
                tracing::warn!(tool = %params.name, error = %e, "Tool call failed");
                ToolResult::error(e.to_string())
            }
        };
        Ok(JsonRpcResponse::success(id, serde_json::to_value(tool_result)?))
    }

    /// Encode an unexpected failure as a JSON-RPC internal error
    pub fn internal_error(error: &Error) -> String {
        serde_json::to_string(&JsonRpcResponse::internal_error(error)).unwrap_or_default()
    }

    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    /// Check if the server is initialized
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

fn encode(response: JsonRpcResponse) -> Result<String> {
    serde_json::to_string(&response).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};
    use gce_test_utils::MockCompute;
    use std::sync::Arc;

    async fn setup() -> (Arc<MockCompute>, GceMcpServer) {
        let mock = Arc::new(MockCompute::new());
        let ctx = ToolContext::new(mock.clone(), "us-central1-a", "us-central1");
        let mut server = GceMcpServer::new(ctx);
        server.initialize().await.unwrap();
        (mock, server)
    }

    async fn call(server: &GceMcpServer, request: &str) -> Value {
        serde_json::from_str(&server.handle_message(request).await.unwrap()).unwrap()
    }

    #[test]
    fn server_creation() {
        let ctx = ToolContext::new(Arc::new(MockCompute::new()), "z", "r");
        let server = GceMcpServer::new(ctx);
        assert!(!server.is_initialized());
        assert!(server.registry().is_empty());
        assert_eq!(server.context().default_zone, "z");
    }

    #[tokio::test]
    async fn server_loads_tools_on_initialize() {
        let (_, server) = setup().await;
        assert!(server.is_initialized());
        assert_eq!(server.registry().len(), 24);
    }

    #[tokio::test]
    async fn test_uninitialized_server_rejects_messages() {
        let ctx = ToolContext::new(Arc::new(MockCompute::new()), "z", "r");
        let server = GceMcpServer::new(ctx);
        let err = server
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotInitialized));
    }

    #[tokio::test]
    async fn test_handle_initialize() {
        let (_, server) = setup().await;

        let response = call(
            &server,
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"1.0"}}}"#,
        )
        .await;

        assert_eq!(response["result"]["serverInfo"]["name"], "gce-mcp");
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_handle_initialized_notification() {
        let (_, server) = setup().await;

        for method in ["initialized", "notifications/initialized"] {
            let request = format!(r#"{{"jsonrpc":"2.0","method":"{}"}}"#, method);
            let response = server.handle_message(&request).await.unwrap();
            assert!(response.is_empty());
        }
    }

    #[tokio::test]
    async fn test_handle_ping() {
        let (_, server) = setup().await;
        let response = call(&server, r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#).await;
        assert_eq!(response["id"], "p");
        assert_eq!(response["result"], json!({}));
    }

    #[tokio::test]
    async fn test_handle_tools_list() {
        let (_, server) = setup().await;

        let response = call(&server, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list","params":{}}"#).await;

        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 24);
        let create = tools.iter().find(|t| t["name"] == "create_instance").unwrap();
        assert_eq!(create["inputSchema"]["required"], json!(["name"]));
        assert!(create["description"].is_string());
    }

    #[tokio::test]
    async fn test_handle_unknown_method() {
        let (_, server) = setup().await;

        let response = call(&server, r#"{"jsonrpc":"2.0","id":4,"method":"resources/list","params":{}}"#).await;

        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
        assert!(response["error"]["message"].as_str().unwrap().contains("Method not found"));
    }

    #[tokio::test]
    async fn test_handle_tools_call_unknown_tool() {
        let (mock, server) = setup().await;

        let response = call(
            &server,
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"unknown_tool","arguments":{}}}"#,
        )
        .await;

        assert_eq!(response["error"]["code"], INVALID_PARAMS);
        assert_eq!(response["error"]["message"], "unknown tool: unknown_tool");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_handle_tools_call_missing_argument() {
        let (mock, server) = setup().await;

        let response = call(
            &server,
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"delete_instance","arguments":{"zone":"us-east1-b"}}}"#,
        )
        .await;

        assert_eq!(response["error"]["code"], INVALID_PARAMS);
        assert_eq!(
            response["error"]["message"],
            "invalid arguments: missing required argument: name"
        );
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_handle_tools_call_bad_params() {
        let (_, server) = setup().await;

        let response = call(
            &server,
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"arguments":{}}}"#,
        )
        .await;

        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_handle_tools_call_success() {
        let (mock, server) = setup().await;

        let response = call(
            &server,
            r#"{"jsonrpc":"2.0","id":8,"method":"tools/call","params":{"name":"stop_instance","arguments":{"name":"web-server"}}}"#,
        )
        .await;

        assert!(response["result"].get("isError").is_none());
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let operation: Value = serde_json::from_str(text).unwrap();
        assert_eq!(operation["name"], "operation-stop_instance");
        assert_eq!(mock.methods(), vec!["stop_instance"]);
    }

    #[tokio::test]
    async fn test_handle_tools_call_provider_error() {
        let (mock, server) = setup().await;
        mock.fail(
            "start_instance",
            403,
            "PERMISSION_DENIED",
            "Required 'compute.instances.start' permission for 'projects/demo-project/zones/us-central1-a/instances/web-server'",
        );

        let response = call(
            &server,
            r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"start_instance","arguments":{"name":"web-server"}}}"#,
        )
        .await;

        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(
            response["result"]["content"][0]["text"],
            "provider error (403 PERMISSION_DENIED): Required 'compute.instances.start' permission for 'projects/demo-project/zones/us-central1-a/instances/web-server'"
        );
    }

    #[tokio::test]
    async fn test_handle_invalid_json() {
        let (_, server) = setup().await;

        let response = call(&server, r#"{"invalid json"#).await;

        assert_eq!(response["error"]["code"], PARSE_ERROR);
        assert_eq!(response["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_handle_invalid_request() {
        let (_, server) = setup().await;

        let response = call(&server, r#"{"jsonrpc":"2.0","id":12}"#).await;
        assert_eq!(response["error"]["code"], INVALID_REQUEST);
        assert_eq!(response["id"], 12);

        let response = call(&server, r#"{"jsonrpc":"1.0","id":13,"method":"ping"}"#).await;
        assert_eq!(response["error"]["code"], INVALID_REQUEST);
        assert_eq!(response["id"], 13);
    }

    #[tokio::test]
    async fn test_serve_lines_answers_requests_in_order() {
        let (_, server) = setup().await;
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n"
        );
        let mut output = Vec::new();

        server.serve_lines(input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["id"], 2);
    }

    #[test]
    fn test_internal_error_encoding() {
        let response: Value =
            serde_json::from_str(&GceMcpServer::internal_error(&Error::NotInitialized)).unwrap();
        assert_eq!(response["error"]["code"], INTERNAL_ERROR);
        assert_eq!(response["error"]["message"], "Internal error: server not initialized");
    }
}
