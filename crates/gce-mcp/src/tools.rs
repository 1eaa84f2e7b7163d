//! MCP tool definitions
//!
//! Every tool the server exposes, with the JSON schema an assistant sees in
//! `tools/list`. The `required` list of each schema is enforced by the
//! [`registry`](crate::registry) before a handler runs.
//!
//! # Tool Categories
//!
//! ## Instances
//! - `list_instances`, `get_instance`
//! - `create_instance`, `delete_instance`
//! - `start_instance`, `stop_instance`, `restart_instance`
//! - `modify_instance` - labels, metadata, machine type
//!
//! ## Disks
//! - `list_disks`, `get_disk`
//! - `add_disk` - create, optionally attach
//! - `modify_disk` - resize, labels, auto-delete
//! - `attach_disk`, `detach_disk`
//!
//! ## Network
//! - `configure_network_interface` - add/remove external access configs
//!
//! ## Operations
//! - `get_operation`
//!
//! ## Kubernetes Engine
//! - `list_clusters`, `get_cluster`, `create_cluster`, `delete_cluster`
//! - `list_node_pools`, `create_node_pool`, `delete_node_pool`, `resize_node_pool`

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Tool definition for MCP protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Argument names the schema marks as required
    pub fn required_arguments(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Result from a tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// Content types for tool results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: content.into(),
            }],
            is_error: None,
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: Some(true),
        }
    }
}

fn zone() -> Value {
    json!({
        "type": "string",
        "description": "Zone (defaults to the configured zone)"
    })
}

fn location() -> Value {
    json!({
        "type": "string",
        "description": "Region or zone of the cluster (defaults to the configured region)"
    })
}

fn instance_name(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn labels() -> Value {
    json!({
        "type": "object",
        "additionalProperties": { "type": "string" },
        "description": "Labels to set; replaces the existing label set"
    })
}

fn node_count() -> Value {
    json!({ "type": "integer", "minimum": 0, "description": "Nodes per zone (default: 3)" })
}

fn node_machine_type() -> Value {
    json!({ "type": "string", "description": "Node machine type (default: e2-standard-2)" })
}

fn node_disk_size() -> Value {
    json!({ "type": "integer", "minimum": 10, "description": "Node boot disk size in GB (default: 100)" })
}

fn node_disk_type() -> Value {
    json!({
        "type": "string",
        "enum": ["pd-standard", "pd-balanced", "pd-ssd"],
        "description": "Node boot disk type (default: pd-standard)"
    })
}

fn page_token() -> Value {
    json!({
        "type": "string",
        "description": "Token from a previous response's nextPageToken"
    })
}

/// Get all available tool definitions
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        // Instances
        ToolDefinition {
            name: "list_instances".to_string(),
            description: "List VM instances in a zone".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "zone": zone(),
                    "page_token": page_token()
                }
            }),
        },
        ToolDefinition {
            name: "get_instance".to_string(),
            description: "Get the full description of a VM instance".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": instance_name("Instance name"),
                    "zone": zone()
                },
                "required": ["name"]
            }),
        },
        ToolDefinition {
            name: "create_instance".to_string(),
            description: "Create a VM instance with a boot disk and a network interface".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": instance_name("Instance name"),
                    "zone": zone(),
                    "machine_type": {
                        "type": "string",
                        "description": "Machine type, e.g. e2-medium (defaults to n1-standard-1)"
                    },
                    "source_image": {
                        "type": "string",
                        "description": "Boot image (defaults to the latest Debian 12 image)"
                    },
                    "disk_size_gb": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Boot disk size in GB"
                    },
                    "labels": labels(),
                    "metadata": {
                        "type": "object",
                        "additionalProperties": { "type": "string" },
                        "description": "Instance metadata, e.g. startup-script"
                    },
                    "network": {
                        "type": "string",
                        "description": "VPC network (defaults to the default network)"
                    },
                    "subnetwork": {
                        "type": "string",
                        "description": "Subnetwork path"
                    },
                    "external_ip": {
                        "type": "boolean",
                        "description": "Attach an ephemeral external IP (default true)"
                    }
                },
                "required": ["name"]
            }),
        },
        ToolDefinition {
            name: "delete_instance".to_string(),
            description: "Delete a VM instance".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": instance_name("Instance to delete"),
                    "zone": zone()
                },
                "required": ["name"]
            }),
        },
        ToolDefinition {
            name: "start_instance".to_string(),
            description: "Start a stopped VM instance".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": instance_name("Instance to start"),
                    "zone": zone()
                },
                "required": ["name"]
            }),
        },
        ToolDefinition {
            name: "stop_instance".to_string(),
            description: "Stop a running VM instance".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": instance_name("Instance to stop"),
                    "zone": zone()
                },
                "required": ["name"]
            }),
        },
        ToolDefinition {
            name: "restart_instance".to_string(),
            description: "Stop a VM instance, wait for it to halt, then start it".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": instance_name("Instance to restart"),
                    "zone": zone()
                },
                "required": ["name"]
            }),
        },
        ToolDefinition {
            name: "modify_instance".to_string(),
            description: "Change labels, metadata or machine type of a VM instance. \
                          A running instance is stopped and restarted for a machine type change"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": instance_name("Instance to modify"),
                    "zone": zone(),
                    "labels": labels(),
                    "metadata": {
                        "type": "object",
                        "additionalProperties": { "type": "string" },
                        "description": "Metadata items to set; replaces the existing items"
                    },
                    "machine_type": {
                        "type": "string",
                        "description": "New machine type"
                    }
                },
                "required": ["name"]
            }),
        },
        // Disks
        ToolDefinition {
            name: "list_disks".to_string(),
            description: "List persistent disks in a zone".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "zone": zone(),
                    "page_token": page_token()
                }
            }),
        },
        ToolDefinition {
            name: "get_disk".to_string(),
            description: "Get the full description of a persistent disk".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Disk name" },
                    "zone": zone()
                },
                "required": ["name"]
            }),
        },
        ToolDefinition {
            name: "add_disk".to_string(),
            description: "Create a persistent disk, optionally attaching it to an instance"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Disk name" },
                    "size_gb": { "type": "integer", "minimum": 1, "description": "Size in GB" },
                    "zone": zone(),
                    "disk_type": {
                        "type": "string",
                        "description": "Disk type, e.g. pd-ssd (defaults to pd-standard)"
                    },
                    "source_image": { "type": "string", "description": "Image to create the disk from" },
                    "labels": labels(),
                    "instance": { "type": "string", "description": "Instance to attach the new disk to" },
                    "device_name": { "type": "string", "description": "Device name when attaching" },
                    "mode": {
                        "type": "string",
                        "enum": ["READ_WRITE", "READ_ONLY"],
                        "description": "Attach mode"
                    },
                    "auto_delete": {
                        "type": "boolean",
                        "description": "Delete the disk together with the instance"
                    }
                },
                "required": ["name", "size_gb"]
            }),
        },
        ToolDefinition {
            name: "modify_disk".to_string(),
            description: "Resize or relabel a disk, or change its auto-delete flag on an instance"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Disk name" },
                    "zone": zone(),
                    "size_gb": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "New size in GB (disks can only grow)"
                    },
                    "labels": labels(),
                    "instance": {
                        "type": "string",
                        "description": "Instance the disk is attached to (for auto_delete)"
                    },
                    "device_name": {
                        "type": "string",
                        "description": "Device name on the instance (defaults to the disk name)"
                    },
                    "auto_delete": { "type": "boolean", "description": "New auto-delete flag" }
                },
                "required": ["name"]
            }),
        },
        ToolDefinition {
            name: "attach_disk".to_string(),
            description: "Attach an existing disk to an instance".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "instance": { "type": "string", "description": "Instance name" },
                    "disk": { "type": "string", "description": "Disk name or full disk path" },
                    "zone": zone(),
                    "device_name": { "type": "string", "description": "Device name on the instance" },
                    "mode": {
                        "type": "string",
                        "enum": ["READ_WRITE", "READ_ONLY"],
                        "description": "Attach mode"
                    },
                    "auto_delete": {
                        "type": "boolean",
                        "description": "Delete the disk together with the instance"
                    },
                    "boot": { "type": "boolean", "description": "Attach as boot disk" }
                },
                "required": ["instance", "disk"]
            }),
        },
        ToolDefinition {
            name: "detach_disk".to_string(),
            description: "Detach a disk from an instance".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "instance": { "type": "string", "description": "Instance name" },
                    "device_name": { "type": "string", "description": "Device name of the disk" },
                    "zone": zone()
                },
                "required": ["instance", "device_name"]
            }),
        },
        // Network
        ToolDefinition {
            name: "configure_network_interface".to_string(),
            description: "Add or remove the external access config of an instance's network interface"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "instance": { "type": "string", "description": "Instance name" },
                    "action": {
                        "type": "string",
                        "enum": ["add_access_config", "delete_access_config"],
                        "description": "Change to apply"
                    },
                    "zone": zone(),
                    "network_interface": {
                        "type": "string",
                        "description": "Interface name (defaults to nic0)"
                    },
                    "access_config_name": {
                        "type": "string",
                        "description": "Access config name (defaults to External NAT)"
                    },
                    "nat_ip": {
                        "type": "string",
                        "description": "Static external IP to assign (ephemeral if omitted)"
                    },
                    "network_tier": {
                        "type": "string",
                        "enum": ["PREMIUM", "STANDARD"],
                        "description": "Network tier of the external IP"
                    }
                },
                "required": ["instance", "action"]
            }),
        },
        // Operations
        ToolDefinition {
            name: "get_operation".to_string(),
            description: "Get the status of a zone operation, optionally waiting for it".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Operation name" },
                    "zone": zone(),
                    "wait": {
                        "type": "boolean",
                        "description": "Block until the operation is done"
                    }
                },
                "required": ["name"]
            }),
        },
        // Kubernetes Engine
        ToolDefinition {
            name: "list_clusters".to_string(),
            description: "List GKE clusters".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "Region or zone; \"-\" lists all locations (default)"
                    }
                }
            }),
        },
        ToolDefinition {
            name: "get_cluster".to_string(),
            description: "Get the full description of a GKE cluster".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Cluster name" },
                    "location": location()
                },
                "required": ["name"]
            }),
        },
        ToolDefinition {
            name: "create_cluster".to_string(),
            description: "Create a GKE cluster: Autopilot, or standard with one initial node pool"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Cluster name" },
                    "location": location(),
                    "autopilot": {
                        "type": "boolean",
                        "description": "Let Google manage the nodes (node pool settings are ignored)"
                    },
                    "node_pool_name": {
                        "type": "string",
                        "description": "Initial node pool name (default: default-pool)"
                    },
                    "node_count": node_count(),
                    "machine_type": node_machine_type(),
                    "disk_size_gb": node_disk_size(),
                    "disk_type": node_disk_type(),
                    "network": { "type": "string", "description": "VPC network" },
                    "subnetwork": { "type": "string", "description": "Subnetwork" },
                    "pod_address_range": { "type": "string", "description": "Pod CIDR, e.g. 10.4.0.0/14" },
                    "service_address_range": { "type": "string", "description": "Service CIDR, e.g. 10.8.0.0/20" },
                    "private_cluster": {
                        "type": "boolean",
                        "description": "Give nodes internal addresses only; requires master_cidr_block"
                    },
                    "master_cidr_block": {
                        "type": "string",
                        "description": "Control plane CIDR for private clusters, e.g. 172.16.0.0/28"
                    },
                    "kubernetes_version": { "type": "string", "description": "Initial Kubernetes version" },
                    "labels": labels()
                },
                "required": ["name"]
            }),
        },
        ToolDefinition {
            name: "delete_cluster".to_string(),
            description: "Delete a GKE cluster and all of its node pools".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Cluster name" },
                    "location": location()
                },
                "required": ["name"]
            }),
        },
        ToolDefinition {
            name: "list_node_pools".to_string(),
            description: "List the node pools of a GKE cluster".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "cluster": { "type": "string", "description": "Cluster name" },
                    "location": location()
                },
                "required": ["cluster"]
            }),
        },
        ToolDefinition {
            name: "create_node_pool".to_string(),
            description: "Add a node pool to a standard GKE cluster".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "cluster": { "type": "string", "description": "Cluster name" },
                    "name": { "type": "string", "description": "Node pool name" },
                    "location": location(),
                    "node_count": node_count(),
                    "machine_type": node_machine_type(),
                    "disk_size_gb": node_disk_size(),
                    "disk_type": node_disk_type(),
                    "min_node_count": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "Autoscaling lower bound; requires max_node_count"
                    },
                    "max_node_count": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Autoscaling upper bound; requires min_node_count"
                    },
                    "node_labels": {
                        "type": "object",
                        "additionalProperties": { "type": "string" },
                        "description": "Kubernetes labels applied to every node"
                    }
                },
                "required": ["cluster", "name"]
            }),
        },
        ToolDefinition {
            name: "delete_node_pool".to_string(),
            description: "Delete a node pool from a GKE cluster".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "cluster": { "type": "string", "description": "Cluster name" },
                    "node_pool": { "type": "string", "description": "Node pool name" },
                    "location": location()
                },
                "required": ["cluster", "node_pool"]
            }),
        },
        ToolDefinition {
            name: "resize_node_pool".to_string(),
            description: "Set the node count of a GKE node pool".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "cluster": { "type": "string", "description": "Cluster name" },
                    "node_pool": { "type": "string", "description": "Node pool name" },
                    "node_count": { "type": "integer", "minimum": 0, "description": "Desired node count" },
                    "location": location()
                },
                "required": ["cluster", "node_pool", "node_count"]
            }),
        },
    ]
}
