//! [`MockCompute`]: a recording [`ComputeApi`] for tests.
//!
//! Every call is recorded with its arguments as JSON, in order. Replies come
//! from a per-method queue filled with [`MockCompute::respond`] or
//! [`MockCompute::fail`]; when a queue is empty a default reply is used
//! (a finished operation, an empty list, or a minimal resource named after
//! the request).

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use gce_compute::{
    AccessConfigSpec, AttachDiskSpec, Cluster, ClusterList, ClusterOperation, ClusterSpec,
    ComputeApi, Disk, DiskList, DiskSpec, Error, Instance, InstanceList, InstanceSpec, Labels,
    NodePoolList, NodePoolSpec, Operation, Result,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// One recorded client call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub args: Value,
}

#[derive(Debug, Clone)]
enum Reply {
    Ok(Value),
    Err {
        status: u16,
        reason: String,
        message: String,
    },
}

#[derive(Debug, Default)]
pub struct MockCompute {
    calls: Mutex<Vec<RecordedCall>>,
    replies: Mutex<HashMap<&'static str, VecDeque<Reply>>>,
}

impl MockCompute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply for the next call to `method`
    pub fn respond(&self, method: &'static str, value: Value) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(Reply::Ok(value));
        self
    }

    /// Queue a provider error for the next call to `method`
    pub fn fail(&self, method: &'static str, status: u16, reason: &str, message: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(Reply::Err {
                status,
                reason: reason.to_string(),
                message: message.to_string(),
            });
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Method names of every call made so far, in order
    pub fn methods(&self) -> Vec<&'static str> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    /// Arguments of every call to `method`
    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .map(|c| c.args)
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn reply<T: DeserializeOwned>(&self, method: &'static str, args: Value) -> Result<T> {
        let queued = self
            .replies
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        let reply = queued.unwrap_or_else(|| Reply::Ok(default_reply(method, &args)));

        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall { method, args });

        match reply {
            Reply::Ok(value) => Ok(serde_json::from_value(value)?),
            Reply::Err {
                status,
                reason,
                message,
            } => Err(Error::Provider {
                status,
                reason,
                message,
            }),
        }
    }
}

fn default_reply(method: &str, args: &Value) -> Value {
    let name = args.get("name").cloned().unwrap_or(Value::Null);
    match method {
        "list_instances" | "list_disks" | "list_clusters" | "list_node_pools" => json!({}),
        "get_instance" => json!({
            "name": name,
            "status": "RUNNING",
            "labelFingerprint": "fp-labels",
            "metadata": {"fingerprint": "fp-metadata"}
        }),
        "get_disk" => json!({"name": name, "labelFingerprint": "fp-disk"}),
        "get_cluster" => json!({"name": name}),
        "get_operation" | "wait_operation" => json!({"name": name, "status": "DONE"}),
        "create_cluster" | "delete_cluster" | "create_node_pool" | "delete_node_pool"
        | "set_node_pool_size" => json!({
            "name": format!("operation-{}", method),
            "operationType": method.to_uppercase(),
            "status": "RUNNING"
        }),
        _ => json!({
            "name": format!("operation-{}", method),
            "operationType": method,
            "status": "DONE"
        }),
    }
}

fn spec_json<T: serde::Serialize>(spec: &T) -> Value {
    serde_json::to_value(spec).unwrap_or(Value::Null)
}

#[async_trait]
impl ComputeApi for MockCompute {
    async fn list_instances(&self, zone: &str, page_token: Option<&str>) -> Result<InstanceList> {
        self.reply(
            "list_instances",
            json!({"zone": zone, "page_token": page_token}),
        )
    }

    async fn get_instance(&self, zone: &str, name: &str) -> Result<Instance> {
        self.reply("get_instance", json!({"zone": zone, "name": name}))
    }

    async fn insert_instance(&self, zone: &str, spec: &InstanceSpec) -> Result<Operation> {
        self.reply(
            "insert_instance",
            json!({"zone": zone, "spec": spec_json(spec)}),
        )
    }

    async fn delete_instance(&self, zone: &str, name: &str) -> Result<Operation> {
        self.reply("delete_instance", json!({"zone": zone, "name": name}))
    }

    async fn start_instance(&self, zone: &str, name: &str) -> Result<Operation> {
        self.reply("start_instance", json!({"zone": zone, "name": name}))
    }

    async fn stop_instance(&self, zone: &str, name: &str) -> Result<Operation> {
        self.reply("stop_instance", json!({"zone": zone, "name": name}))
    }

    async fn set_instance_labels(
        &self,
        zone: &str,
        name: &str,
        labels: &Labels,
        fingerprint: Option<&str>,
    ) -> Result<Operation> {
        self.reply(
            "set_instance_labels",
            json!({"zone": zone, "name": name, "labels": labels, "fingerprint": fingerprint}),
        )
    }

    async fn set_instance_metadata(
        &self,
        zone: &str,
        name: &str,
        items: &BTreeMap<String, String>,
        fingerprint: Option<&str>,
    ) -> Result<Operation> {
        self.reply(
            "set_instance_metadata",
            json!({"zone": zone, "name": name, "items": items, "fingerprint": fingerprint}),
        )
    }

    async fn set_machine_type(
        &self,
        zone: &str,
        name: &str,
        machine_type: &str,
    ) -> Result<Operation> {
        self.reply(
            "set_machine_type",
            json!({"zone": zone, "name": name, "machine_type": machine_type}),
        )
    }

    async fn list_disks(&self, zone: &str, page_token: Option<&str>) -> Result<DiskList> {
        self.reply("list_disks", json!({"zone": zone, "page_token": page_token}))
    }

    async fn get_disk(&self, zone: &str, name: &str) -> Result<Disk> {
        self.reply("get_disk", json!({"zone": zone, "name": name}))
    }

    async fn insert_disk(&self, zone: &str, spec: &DiskSpec) -> Result<Operation> {
        self.reply("insert_disk", json!({"zone": zone, "spec": spec_json(spec)}))
    }

    async fn resize_disk(&self, zone: &str, name: &str, size_gb: u64) -> Result<Operation> {
        self.reply(
            "resize_disk",
            json!({"zone": zone, "name": name, "size_gb": size_gb}),
        )
    }

    async fn set_disk_labels(
        &self,
        zone: &str,
        name: &str,
        labels: &Labels,
        fingerprint: Option<&str>,
    ) -> Result<Operation> {
        self.reply(
            "set_disk_labels",
            json!({"zone": zone, "name": name, "labels": labels, "fingerprint": fingerprint}),
        )
    }

    async fn attach_disk(
        &self,
        zone: &str,
        instance: &str,
        spec: &AttachDiskSpec,
    ) -> Result<Operation> {
        self.reply(
            "attach_disk",
            json!({"zone": zone, "instance": instance, "spec": spec_json(spec)}),
        )
    }

    async fn detach_disk(
        &self,
        zone: &str,
        instance: &str,
        device_name: &str,
    ) -> Result<Operation> {
        self.reply(
            "detach_disk",
            json!({"zone": zone, "instance": instance, "device_name": device_name}),
        )
    }

    async fn set_disk_auto_delete(
        &self,
        zone: &str,
        instance: &str,
        device_name: &str,
        auto_delete: bool,
    ) -> Result<Operation> {
        self.reply(
            "set_disk_auto_delete",
            json!({
                "zone": zone,
                "instance": instance,
                "device_name": device_name,
                "auto_delete": auto_delete
            }),
        )
    }

    async fn add_access_config(
        &self,
        zone: &str,
        instance: &str,
        network_interface: &str,
        spec: &AccessConfigSpec,
    ) -> Result<Operation> {
        self.reply(
            "add_access_config",
            json!({
                "zone": zone,
                "instance": instance,
                "network_interface": network_interface,
                "spec": spec_json(spec)
            }),
        )
    }

    async fn delete_access_config(
        &self,
        zone: &str,
        instance: &str,
        network_interface: &str,
        access_config: &str,
    ) -> Result<Operation> {
        self.reply(
            "delete_access_config",
            json!({
                "zone": zone,
                "instance": instance,
                "network_interface": network_interface,
                "access_config": access_config
            }),
        )
    }

    async fn get_operation(&self, zone: &str, name: &str) -> Result<Operation> {
        self.reply("get_operation", json!({"zone": zone, "name": name}))
    }

    async fn wait_operation(&self, zone: &str, name: &str) -> Result<Operation> {
        self.reply("wait_operation", json!({"zone": zone, "name": name}))
    }

    async fn list_clusters(&self, location: &str) -> Result<ClusterList> {
        self.reply("list_clusters", json!({"location": location}))
    }

    async fn get_cluster(&self, location: &str, name: &str) -> Result<Cluster> {
        self.reply("get_cluster", json!({"location": location, "name": name}))
    }

    async fn create_cluster(
        &self,
        location: &str,
        spec: &ClusterSpec,
    ) -> Result<ClusterOperation> {
        self.reply(
            "create_cluster",
            json!({"location": location, "spec": spec_json(spec)}),
        )
    }

    async fn delete_cluster(&self, location: &str, name: &str) -> Result<ClusterOperation> {
        self.reply("delete_cluster", json!({"location": location, "name": name}))
    }

    async fn list_node_pools(&self, location: &str, cluster: &str) -> Result<NodePoolList> {
        self.reply(
            "list_node_pools",
            json!({"location": location, "cluster": cluster}),
        )
    }

    async fn create_node_pool(
        &self,
        location: &str,
        cluster: &str,
        spec: &NodePoolSpec,
    ) -> Result<ClusterOperation> {
        self.reply(
            "create_node_pool",
            json!({"location": location, "cluster": cluster, "spec": spec_json(spec)}),
        )
    }

    async fn delete_node_pool(
        &self,
        location: &str,
        cluster: &str,
        node_pool: &str,
    ) -> Result<ClusterOperation> {
        self.reply(
            "delete_node_pool",
            json!({"location": location, "cluster": cluster, "node_pool": node_pool}),
        )
    }

    async fn set_node_pool_size(
        &self,
        location: &str,
        cluster: &str,
        node_pool: &str,
        node_count: u32,
    ) -> Result<ClusterOperation> {
        self.reply(
            "set_node_pool_size",
            json!({
                "location": location,
                "cluster": cluster,
                "node_pool": node_pool,
                "node_count": node_count
            }),
        )
    }
}
