//! MCP Tool Handlers
//!
//! Each handler decodes its arguments into a typed struct, fills in the
//! configured zone or region, and makes one [`ComputeApi`] call (or runs one
//! [`workflow`]). The provider's response is returned as JSON unchanged.

use std::collections::BTreeMap;
use std::sync::Arc;

use gce_compute::models::{
    DEFAULT_ACCESS_CONFIG_NAME, DEFAULT_MACHINE_TYPE, DEFAULT_NODE_POOL_NAME, DEFAULT_SOURCE_IMAGE,
};
use gce_compute::{
    AccessConfigSpec, AttachDiskSpec, ClusterSpec, ComputeApi, DiskSpec, InstanceSpec, Labels,
    NodePoolSpec, workflow,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Location value that lists clusters across every region and zone
pub const ALL_LOCATIONS: &str = "-";

/// Default interface for network changes
pub const DEFAULT_NETWORK_INTERFACE: &str = "nic0";

/// Arguments that name a resource in the request path
const PATH_ARGUMENTS: &[&str] = &["name", "zone", "instance", "cluster", "node_pool", "location"];

/// What every handler needs: the client and the configured defaults
#[derive(Clone)]
pub struct ToolContext {
    pub api: Arc<dyn ComputeApi>,
    pub default_zone: String,
    pub default_region: String,
}

impl ToolContext {
    pub fn new(
        api: Arc<dyn ComputeApi>,
        default_zone: impl Into<String>,
        default_region: impl Into<String>,
    ) -> Self {
        Self {
            api,
            default_zone: default_zone.into(),
            default_region: default_region.into(),
        }
    }

    fn zone(&self, zone: Option<String>) -> String {
        zone.unwrap_or_else(|| self.default_zone.clone())
    }

    fn location(&self, location: Option<String>) -> String {
        location.unwrap_or_else(|| self.default_region.clone())
    }

    fn api(&self) -> &dyn ComputeApi {
        self.api.as_ref()
    }
}

/// Handle a tool call by dispatching to the appropriate handler
pub async fn handle_tool_call(ctx: &ToolContext, tool_name: &str, arguments: Value) -> Result<Value> {
    match tool_name {
        // Instances
        "list_instances" => handle_list_instances(ctx, parse(arguments)?).await,
        "get_instance" => handle_get_instance(ctx, parse(arguments)?).await,
        "create_instance" => handle_create_instance(ctx, parse(arguments)?).await,
        "delete_instance" => handle_delete_instance(ctx, parse(arguments)?).await,
        "start_instance" => handle_start_instance(ctx, parse(arguments)?).await,
        "stop_instance" => handle_stop_instance(ctx, parse(arguments)?).await,
        "restart_instance" => handle_restart_instance(ctx, parse(arguments)?).await,
        "modify_instance" => handle_modify_instance(ctx, parse(arguments)?).await,

        // Disks
        "list_disks" => handle_list_disks(ctx, parse(arguments)?).await,
        "get_disk" => handle_get_disk(ctx, parse(arguments)?).await,
        "add_disk" => handle_add_disk(ctx, parse(arguments)?).await,
        "modify_disk" => handle_modify_disk(ctx, parse(arguments)?).await,
        "attach_disk" => handle_attach_disk(ctx, parse(arguments)?).await,
        "detach_disk" => handle_detach_disk(ctx, parse(arguments)?).await,

        // Network
        "configure_network_interface" => handle_configure_network(ctx, parse(arguments)?).await,

        // Operations
        "get_operation" => handle_get_operation(ctx, parse(arguments)?).await,

        // Kubernetes Engine
        "list_clusters" => handle_list_clusters(ctx, parse(arguments)?).await,
        "get_cluster" => handle_get_cluster(ctx, parse(arguments)?).await,
        "create_cluster" => handle_create_cluster(ctx, parse(arguments)?).await,
        "delete_cluster" => handle_delete_cluster(ctx, parse(arguments)?).await,
        "list_node_pools" => handle_list_node_pools(ctx, parse(arguments)?).await,
        "create_node_pool" => handle_create_node_pool(ctx, parse(arguments)?).await,
        "delete_node_pool" => handle_delete_node_pool(ctx, parse(arguments)?).await,
        "resize_node_pool" => handle_resize_node_pool(ctx, parse(arguments)?).await,

        _ => Err(Error::UnknownTool(tool_name.to_string())),
    }
}

/// Decode tool arguments; a missing argument object counts as empty
fn parse<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    check_path_arguments(&arguments)?;
    serde_json::from_value(arguments).map_err(|e| Error::invalid_arguments(e.to_string()))
}

/// Refuse resource names that would address a different path
fn check_path_arguments(arguments: &Value) -> Result<()> {
    for key in PATH_ARGUMENTS {
        if let Some(value) = arguments.get(*key).and_then(Value::as_str) {
            if matches!(value.trim(), "" | "." | "..") {
                return Err(Error::invalid_arguments(format!(
                    "{} must name a resource, got {:?}",
                    key, value
                )));
            }
        }
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(Error::from)
}

// ============================================================================
// Argument shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListArgs {
    zone: Option<String>,
    page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NameArgs {
    name: String,
    zone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateInstanceArgs {
    name: String,
    zone: Option<String>,
    machine_type: Option<String>,
    source_image: Option<String>,
    disk_size_gb: Option<u64>,
    labels: Option<Labels>,
    metadata: Option<BTreeMap<String, String>>,
    network: Option<String>,
    subnetwork: Option<String>,
    external_ip: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ModifyInstanceArgs {
    name: String,
    zone: Option<String>,
    labels: Option<Labels>,
    metadata: Option<BTreeMap<String, String>>,
    machine_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddDiskArgs {
    name: String,
    size_gb: u64,
    zone: Option<String>,
    disk_type: Option<String>,
    source_image: Option<String>,
    labels: Option<Labels>,
    instance: Option<String>,
    device_name: Option<String>,
    mode: Option<String>,
    auto_delete: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ModifyDiskArgs {
    name: String,
    zone: Option<String>,
    size_gb: Option<u64>,
    labels: Option<Labels>,
    instance: Option<String>,
    device_name: Option<String>,
    auto_delete: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct AttachDiskArgs {
    instance: String,
    disk: String,
    zone: Option<String>,
    device_name: Option<String>,
    mode: Option<String>,
    auto_delete: Option<bool>,
    boot: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct DetachDiskArgs {
    instance: String,
    device_name: String,
    zone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum NetworkAction {
    AddAccessConfig,
    DeleteAccessConfig,
}

#[derive(Debug, Deserialize)]
struct ConfigureNetworkArgs {
    instance: String,
    action: NetworkAction,
    zone: Option<String>,
    network_interface: Option<String>,
    access_config_name: Option<String>,
    nat_ip: Option<String>,
    network_tier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetOperationArgs {
    name: String,
    zone: Option<String>,
    #[serde(default)]
    wait: bool,
}

#[derive(Debug, Deserialize)]
struct ListClustersArgs {
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClusterArgs {
    name: String,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NodePoolsArgs {
    cluster: String,
    location: Option<String>,
}

/// Node settings shared by new clusters and new node pools
#[derive(Debug, Deserialize)]
struct NodeShapeArgs {
    node_count: Option<u32>,
    machine_type: Option<String>,
    disk_size_gb: Option<u32>,
    disk_type: Option<String>,
}

impl NodeShapeArgs {
    fn into_spec(self, name: String) -> NodePoolSpec {
        let mut spec = NodePoolSpec::new(name);
        if let Some(count) = self.node_count {
            spec.node_count = count;
        }
        if let Some(machine_type) = self.machine_type {
            spec.machine_type = machine_type;
        }
        if let Some(size) = self.disk_size_gb {
            spec.disk_size_gb = size;
        }
        if let Some(disk_type) = self.disk_type {
            spec.disk_type = disk_type;
        }
        spec
    }
}

#[derive(Debug, Deserialize)]
struct CreateClusterArgs {
    name: String,
    location: Option<String>,
    #[serde(default)]
    autopilot: bool,
    node_pool_name: Option<String>,
    #[serde(flatten)]
    nodes: NodeShapeArgs,
    network: Option<String>,
    subnetwork: Option<String>,
    pod_address_range: Option<String>,
    service_address_range: Option<String>,
    #[serde(default)]
    private_cluster: bool,
    master_cidr_block: Option<String>,
    kubernetes_version: Option<String>,
    labels: Option<Labels>,
}

#[derive(Debug, Deserialize)]
struct CreateNodePoolArgs {
    cluster: String,
    name: String,
    location: Option<String>,
    #[serde(flatten)]
    nodes: NodeShapeArgs,
    min_node_count: Option<u32>,
    max_node_count: Option<u32>,
    node_labels: Option<Labels>,
}

#[derive(Debug, Deserialize)]
struct NodePoolArgs {
    cluster: String,
    node_pool: String,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResizeNodePoolArgs {
    cluster: String,
    node_pool: String,
    node_count: u32,
    location: Option<String>,
}

// ============================================================================
// Instance Handlers
// ============================================================================

async fn handle_list_instances(ctx: &ToolContext, args: ListArgs) -> Result<Value> {
    let zone = ctx.zone(args.zone);
    let list = ctx
        .api()
        .list_instances(&zone, args.page_token.as_deref())
        .await?;
    to_json(&list)
}

async fn handle_get_instance(ctx: &ToolContext, args: NameArgs) -> Result<Value> {
    let zone = ctx.zone(args.zone);
    let instance = ctx.api().get_instance(&zone, &args.name).await?;
    to_json(&instance)
}

async fn handle_create_instance(ctx: &ToolContext, args: CreateInstanceArgs) -> Result<Value> {
    let zone = ctx.zone(args.zone);
    let spec = InstanceSpec {
        name: args.name,
        machine_type: args
            .machine_type
            .unwrap_or_else(|| DEFAULT_MACHINE_TYPE.to_string()),
        source_image: args
            .source_image
            .unwrap_or_else(|| DEFAULT_SOURCE_IMAGE.to_string()),
        disk_size_gb: args.disk_size_gb,
        labels: args.labels.unwrap_or_default(),
        metadata: args.metadata.unwrap_or_default(),
        network: args.network,
        subnetwork: args.subnetwork,
        external_ip: args.external_ip.unwrap_or(true),
    };

    let operation = ctx.api().insert_instance(&zone, &spec).await?;
    to_json(&operation)
}

async fn handle_delete_instance(ctx: &ToolContext, args: NameArgs) -> Result<Value> {
    let zone = ctx.zone(args.zone);
    let operation = ctx.api().delete_instance(&zone, &args.name).await?;
    to_json(&operation)
}

async fn handle_start_instance(ctx: &ToolContext, args: NameArgs) -> Result<Value> {
    let zone = ctx.zone(args.zone);
    let operation = ctx.api().start_instance(&zone, &args.name).await?;
    to_json(&operation)
}

async fn handle_stop_instance(ctx: &ToolContext, args: NameArgs) -> Result<Value> {
    let zone = ctx.zone(args.zone);
    let operation = ctx.api().stop_instance(&zone, &args.name).await?;
    to_json(&operation)
}

async fn handle_restart_instance(ctx: &ToolContext, args: NameArgs) -> Result<Value> {
    let zone = ctx.zone(args.zone);
    let outcome = workflow::restart_instance(ctx.api(), &zone, &args.name).await?;
    to_json(&outcome)
}

/// Apply label, metadata and machine-type changes in that order.
///
/// Labels and metadata carry the fingerprints read from the instance just
/// before the change; the provider rejects the write if they are stale.
async fn handle_modify_instance(ctx: &ToolContext, args: ModifyInstanceArgs) -> Result<Value> {
    if args.labels.is_none() && args.metadata.is_none() && args.machine_type.is_none() {
        return Err(Error::invalid_arguments(
            "nothing to modify: provide labels, metadata or machine_type",
        ));
    }

    let zone = ctx.zone(args.zone);
    let api = ctx.api();
    let mut result = Map::new();

    if args.labels.is_some() || args.metadata.is_some() {
        let instance = api.get_instance(&zone, &args.name).await?;

        if let Some(labels) = &args.labels {
            let operation = api
                .set_instance_labels(
                    &zone,
                    &args.name,
                    labels,
                    instance.label_fingerprint.as_deref(),
                )
                .await?;
            result.insert("labels".to_string(), to_json(&operation)?);
        }

        if let Some(items) = &args.metadata {
            let fingerprint = instance
                .metadata
                .as_ref()
                .and_then(|m| m.fingerprint.as_deref());
            let operation = api
                .set_instance_metadata(&zone, &args.name, items, fingerprint)
                .await?;
            result.insert("metadata".to_string(), to_json(&operation)?);
        }
    }

    if let Some(machine_type) = &args.machine_type {
        let outcome = workflow::change_machine_type(api, &zone, &args.name, machine_type).await?;
        result.insert("machine_type".to_string(), to_json(&outcome)?);
    }

    Ok(Value::Object(result))
}

// ============================================================================
// Disk Handlers
// ============================================================================

async fn handle_list_disks(ctx: &ToolContext, args: ListArgs) -> Result<Value> {
    let zone = ctx.zone(args.zone);
    let list = ctx
        .api()
        .list_disks(&zone, args.page_token.as_deref())
        .await?;
    to_json(&list)
}

async fn handle_get_disk(ctx: &ToolContext, args: NameArgs) -> Result<Value> {
    let zone = ctx.zone(args.zone);
    let disk = ctx.api().get_disk(&zone, &args.name).await?;
    to_json(&disk)
}

async fn handle_add_disk(ctx: &ToolContext, args: AddDiskArgs) -> Result<Value> {
    let zone = ctx.zone(args.zone);
    let spec = DiskSpec {
        name: args.name,
        size_gb: args.size_gb,
        disk_type: args.disk_type,
        source_image: args.source_image,
        labels: args.labels.unwrap_or_default(),
    };
    let attach = args.instance.map(|instance| {
        let attach_spec = AttachDiskSpec {
            source: spec.name.clone(),
            device_name: args.device_name,
            mode: args.mode,
            auto_delete: args.auto_delete,
            boot: None,
        };
        (instance, attach_spec)
    });

    let outcome = workflow::add_disk(
        ctx.api(),
        &zone,
        &spec,
        attach.as_ref().map(|(instance, s)| (instance.as_str(), s)),
    )
    .await?;
    to_json(&outcome)
}

/// Resize, relabel and change auto-delete, in that order, for whichever are given
async fn handle_modify_disk(ctx: &ToolContext, args: ModifyDiskArgs) -> Result<Value> {
    if args.size_gb.is_none() && args.labels.is_none() && args.auto_delete.is_none() {
        return Err(Error::invalid_arguments(
            "nothing to modify: provide size_gb, labels or auto_delete",
        ));
    }
    if args.auto_delete.is_some() && args.instance.is_none() {
        return Err(Error::invalid_arguments(
            "auto_delete requires the instance the disk is attached to",
        ));
    }

    let zone = ctx.zone(args.zone);
    let api = ctx.api();
    let mut result = Map::new();

    if let Some(size_gb) = args.size_gb {
        let operation = api.resize_disk(&zone, &args.name, size_gb).await?;
        result.insert("resize".to_string(), to_json(&operation)?);
    }

    if let Some(labels) = &args.labels {
        let disk = api.get_disk(&zone, &args.name).await?;
        let operation = api
            .set_disk_labels(&zone, &args.name, labels, disk.label_fingerprint.as_deref())
            .await?;
        result.insert("labels".to_string(), to_json(&operation)?);
    }

    if let (Some(auto_delete), Some(instance)) = (args.auto_delete, &args.instance) {
        let device_name = args.device_name.as_deref().unwrap_or(args.name.as_str());
        let operation = api
            .set_disk_auto_delete(&zone, instance, device_name, auto_delete)
            .await?;
        result.insert("auto_delete".to_string(), to_json(&operation)?);
    }

    Ok(Value::Object(result))
}

async fn handle_attach_disk(ctx: &ToolContext, args: AttachDiskArgs) -> Result<Value> {
    let zone = ctx.zone(args.zone);
    let spec = AttachDiskSpec {
        source: args.disk,
        device_name: args.device_name,
        mode: args.mode,
        auto_delete: args.auto_delete,
        boot: args.boot,
    };
    let operation = ctx.api().attach_disk(&zone, &args.instance, &spec).await?;
    to_json(&operation)
}

async fn handle_detach_disk(ctx: &ToolContext, args: DetachDiskArgs) -> Result<Value> {
    let zone = ctx.zone(args.zone);
    let operation = ctx
        .api()
        .detach_disk(&zone, &args.instance, &args.device_name)
        .await?;
    to_json(&operation)
}

// ============================================================================
// Network Handlers
// ============================================================================

async fn handle_configure_network(ctx: &ToolContext, args: ConfigureNetworkArgs) -> Result<Value> {
    let zone = ctx.zone(args.zone);
    let nic = args
        .network_interface
        .unwrap_or_else(|| DEFAULT_NETWORK_INTERFACE.to_string());
    let config_name = args
        .access_config_name
        .unwrap_or_else(|| DEFAULT_ACCESS_CONFIG_NAME.to_string());

    tracing::debug!(zone = %zone, instance = %args.instance, nic = %nic, action = ?args.action, "Configuring network interface");
    let operation = match args.action {
        NetworkAction::AddAccessConfig => {
            let spec = AccessConfigSpec {
                name: config_name,
                nat_ip: args.nat_ip,
                network_tier: args.network_tier,
            };
            ctx.api()
                .add_access_config(&zone, &args.instance, &nic, &spec)
                .await?
        }
        NetworkAction::DeleteAccessConfig => {
            ctx.api()
                .delete_access_config(&zone, &args.instance, &nic, &config_name)
                .await?
        }
    };
    to_json(&operation)
}

// ============================================================================
// Operation Handlers
// ============================================================================

async fn handle_get_operation(ctx: &ToolContext, args: GetOperationArgs) -> Result<Value> {
    let zone = ctx.zone(args.zone);
    let operation = if args.wait {
        ctx.api().wait_operation(&zone, &args.name).await?
    } else {
        ctx.api().get_operation(&zone, &args.name).await?
    };
    to_json(&operation)
}

// ============================================================================
// Kubernetes Engine Handlers
// ============================================================================

async fn handle_list_clusters(ctx: &ToolContext, args: ListClustersArgs) -> Result<Value> {
    let location = args.location.unwrap_or_else(|| ALL_LOCATIONS.to_string());
    let list = ctx.api().list_clusters(&location).await?;
    to_json(&list)
}

async fn handle_get_cluster(ctx: &ToolContext, args: ClusterArgs) -> Result<Value> {
    let location = ctx.location(args.location);
    let cluster = ctx.api().get_cluster(&location, &args.name).await?;
    to_json(&cluster)
}

async fn handle_create_cluster(ctx: &ToolContext, args: CreateClusterArgs) -> Result<Value> {
    let master_ipv4_cidr = match (args.private_cluster, args.master_cidr_block) {
        (true, None) => {
            return Err(Error::invalid_arguments(
                "master_cidr_block is required for a private cluster",
            ));
        }
        (true, cidr) => cidr,
        (false, _) => None,
    };
    let node_pool = if args.autopilot {
        None
    } else {
        let name = args
            .node_pool_name
            .unwrap_or_else(|| DEFAULT_NODE_POOL_NAME.to_string());
        Some(args.nodes.into_spec(name))
    };

    let location = ctx.location(args.location);
    let spec = ClusterSpec {
        name: args.name,
        autopilot: args.autopilot,
        node_pool,
        network: args.network,
        subnetwork: args.subnetwork,
        pod_ipv4_cidr: args.pod_address_range,
        services_ipv4_cidr: args.service_address_range,
        master_ipv4_cidr,
        kubernetes_version: args.kubernetes_version,
        labels: args.labels.unwrap_or_default(),
    };
    let operation = ctx.api().create_cluster(&location, &spec).await?;
    to_json(&operation)
}

async fn handle_delete_cluster(ctx: &ToolContext, args: ClusterArgs) -> Result<Value> {
    let location = ctx.location(args.location);
    let operation = ctx.api().delete_cluster(&location, &args.name).await?;
    to_json(&operation)
}

async fn handle_list_node_pools(ctx: &ToolContext, args: NodePoolsArgs) -> Result<Value> {
    let location = ctx.location(args.location);
    let list = ctx.api().list_node_pools(&location, &args.cluster).await?;
    to_json(&list)
}

async fn handle_create_node_pool(ctx: &ToolContext, args: CreateNodePoolArgs) -> Result<Value> {
    let autoscaling = match (args.min_node_count, args.max_node_count) {
        (None, None) => None,
        (Some(min), Some(max)) if min <= max => Some((min, max)),
        (Some(_), Some(_)) => {
            return Err(Error::invalid_arguments(
                "min_node_count must not exceed max_node_count",
            ));
        }
        _ => {
            return Err(Error::invalid_arguments(
                "autoscaling needs both min_node_count and max_node_count",
            ));
        }
    };

    let location = ctx.location(args.location);
    let mut spec = args.nodes.into_spec(args.name);
    spec.autoscaling = autoscaling;
    spec.node_labels = args.node_labels.unwrap_or_default();

    let operation = ctx
        .api()
        .create_node_pool(&location, &args.cluster, &spec)
        .await?;
    to_json(&operation)
}

async fn handle_delete_node_pool(ctx: &ToolContext, args: NodePoolArgs) -> Result<Value> {
    let location = ctx.location(args.location);
    let operation = ctx
        .api()
        .delete_node_pool(&location, &args.cluster, &args.node_pool)
        .await?;
    to_json(&operation)
}

async fn handle_resize_node_pool(ctx: &ToolContext, args: ResizeNodePoolArgs) -> Result<Value> {
    let location = ctx.location(args.location);
    let operation = ctx
        .api()
        .set_node_pool_size(&location, &args.cluster, &args.node_pool, args.node_count)
        .await?;
    to_json(&operation)
}
