//! Resource descriptors and request shapes
//!
//! Descriptors mirror the provider's JSON resources. Fields this crate does
//! not name are kept in a flattened `extra` map so a response can be handed
//! back to a caller without losing anything.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields not modelled explicitly
pub type Extra = Map<String, Value>;

/// Key/value labels attached to a resource
pub type Labels = BTreeMap<String, String>;

/// Default boot image for new instances
pub const DEFAULT_SOURCE_IMAGE: &str = "projects/debian-cloud/global/images/family/debian-12";

/// Default machine type for new instances
pub const DEFAULT_MACHINE_TYPE: &str = "n1-standard-1";

/// Default VPC network
pub const DEFAULT_NETWORK: &str = "global/networks/default";

/// Name the provider conventionally gives the external NAT access config
pub const DEFAULT_ACCESS_CONFIG_NAME: &str = "External NAT";

/// Node pool defaults for new Kubernetes Engine clusters and pools
pub const DEFAULT_NODE_POOL_NAME: &str = "default-pool";
pub const DEFAULT_NODE_COUNT: u32 = 3;
pub const DEFAULT_NODE_MACHINE_TYPE: &str = "e2-standard-2";
pub const DEFAULT_NODE_DISK_SIZE_GB: u32 = 100;
pub const DEFAULT_NODE_DISK_TYPE: &str = "pd-standard";

/// Operation status once the provider has finished the work
pub const OPERATION_DONE: &str = "DONE";

// ============================================================================
// Instances
// ============================================================================

/// A Compute Engine VM instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_interfaces: Vec<NetworkInterface>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disks: Vec<AttachedDisk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Instance {
    /// Whether the provider reports the instance as running
    pub fn is_running(&self) -> bool {
        self.status.as_deref() == Some("RUNNING")
    }
}

/// One page of instances
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceList {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Instance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Instance metadata block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<MetadataItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataItem {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A disk reference as seen from an instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A NIC on an instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<String>,
    #[serde(rename = "networkIP", skip_serializing_if = "Option::is_none")]
    pub network_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_configs: Vec<AccessConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// External access (NAT) configuration of a NIC
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "natIP", skip_serializing_if = "Option::is_none")]
    pub nat_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_tier: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ============================================================================
// Disks
// ============================================================================

/// A persistent disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// int64 encoded as a string, as the API sends it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_gb: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Instances the disk is attached to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One page of disks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskList {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Disk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ============================================================================
// Operations
// ============================================================================

/// A zonal long-running operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationErrors>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Operation {
    pub fn is_done(&self) -> bool {
        self.status.as_deref() == Some(OPERATION_DONE)
    }

    /// Provider error messages joined, if the operation failed
    pub fn failure_message(&self) -> Option<String> {
        let errors = self.error.as_ref()?;
        if errors.errors.is_empty() {
            return None;
        }
        Some(
            errors
                .errors
                .iter()
                .map(|e| match &e.code {
                    Some(code) => format!("{}: {}", code, e.message.as_deref().unwrap_or("")),
                    None => e.message.clone().unwrap_or_default(),
                })
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationErrors {
    #[serde(default)]
    pub errors: Vec<OperationError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ============================================================================
// Kubernetes Engine
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_master_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_node_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_pools: Vec<NodePool>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterList {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<Cluster>,
    /// Locations that could not be reached when listing across all of them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_zones: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePool {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_node_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolList {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_pools: Vec<NodePool>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A Kubernetes Engine operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOperation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_link: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ============================================================================
// Request shapes
// ============================================================================

/// Caller-supplied fields for a new instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub name: String,
    pub machine_type: String,
    pub source_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<u64>,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<String>,
    pub external_ip: bool,
}

impl InstanceSpec {
    pub fn new(name: impl Into<String>, machine_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            machine_type: machine_type.into(),
            source_image: DEFAULT_SOURCE_IMAGE.to_string(),
            disk_size_gb: None,
            labels: Labels::new(),
            metadata: BTreeMap::new(),
            network: None,
            subnetwork: None,
            external_ip: true,
        }
    }
}

/// Caller-supplied fields for a new persistent disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSpec {
    pub name: String,
    pub size_gb: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    #[serde(default)]
    pub labels: Labels,
}

/// Caller-supplied fields for attaching an existing disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachDiskSpec {
    /// Disk name or full `projects/.../disks/...` path
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot: Option<bool>,
}

/// Caller-supplied fields for a new Kubernetes Engine cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub name: String,
    /// Autopilot clusters have their nodes managed by the provider
    pub autopilot: bool,
    /// Initial pool for standard clusters; ignored for Autopilot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_pool: Option<NodePoolSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_ipv4_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services_ipv4_cidr: Option<String>,
    /// Control plane range; setting it makes the nodes private
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_ipv4_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    #[serde(default)]
    pub labels: Labels,
}

impl ClusterSpec {
    /// A standard cluster with one default node pool
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            autopilot: false,
            node_pool: Some(NodePoolSpec::new(DEFAULT_NODE_POOL_NAME)),
            network: None,
            subnetwork: None,
            pod_ipv4_cidr: None,
            services_ipv4_cidr: None,
            master_ipv4_cidr: None,
            kubernetes_version: None,
            labels: Labels::new(),
        }
    }
}

/// Caller-supplied fields for a new node pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePoolSpec {
    pub name: String,
    pub node_count: u32,
    pub machine_type: String,
    pub disk_size_gb: u32,
    pub disk_type: String,
    /// Autoscaling bounds as `(min, max)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<(u32, u32)>,
    /// Kubernetes labels applied to every node
    #[serde(default)]
    pub node_labels: Labels,
}

impl NodePoolSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_count: DEFAULT_NODE_COUNT,
            machine_type: DEFAULT_NODE_MACHINE_TYPE.to_string(),
            disk_size_gb: DEFAULT_NODE_DISK_SIZE_GB,
            disk_type: DEFAULT_NODE_DISK_TYPE.to_string(),
            autoscaling: None,
            node_labels: Labels::new(),
        }
    }
}

/// Caller-supplied fields for a new access config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessConfigSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nat_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_tier: Option<String>,
}
