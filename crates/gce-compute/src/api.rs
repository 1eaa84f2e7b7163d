//! The resource client seam
//!
//! One method per provider call. Implementations forward arguments as given
//! and return the provider's response or error without reinterpretation.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::Result;
use crate::models::{
    AccessConfigSpec, AttachDiskSpec, Cluster, ClusterList, ClusterOperation, ClusterSpec, Disk,
    DiskList, DiskSpec, Instance, InstanceList, InstanceSpec, Labels, NodePoolList, NodePoolSpec,
    Operation,
};

#[async_trait]
pub trait ComputeApi: Send + Sync {
    // Instances
    async fn list_instances(&self, zone: &str, page_token: Option<&str>) -> Result<InstanceList>;
    async fn get_instance(&self, zone: &str, name: &str) -> Result<Instance>;
    async fn insert_instance(&self, zone: &str, spec: &InstanceSpec) -> Result<Operation>;
    async fn delete_instance(&self, zone: &str, name: &str) -> Result<Operation>;
    async fn start_instance(&self, zone: &str, name: &str) -> Result<Operation>;
    async fn stop_instance(&self, zone: &str, name: &str) -> Result<Operation>;
    async fn set_instance_labels(
        &self,
        zone: &str,
        name: &str,
        labels: &Labels,
        fingerprint: Option<&str>,
    ) -> Result<Operation>;
    async fn set_instance_metadata(
        &self,
        zone: &str,
        name: &str,
        items: &BTreeMap<String, String>,
        fingerprint: Option<&str>,
    ) -> Result<Operation>;
    async fn set_machine_type(
        &self,
        zone: &str,
        name: &str,
        machine_type: &str,
    ) -> Result<Operation>;

    // Disks
    async fn list_disks(&self, zone: &str, page_token: Option<&str>) -> Result<DiskList>;
    async fn get_disk(&self, zone: &str, name: &str) -> Result<Disk>;
    async fn insert_disk(&self, zone: &str, spec: &DiskSpec) -> Result<Operation>;
    async fn resize_disk(&self, zone: &str, name: &str, size_gb: u64) -> Result<Operation>;
    async fn set_disk_labels(
        &self,
        zone: &str,
        name: &str,
        labels: &Labels,
        fingerprint: Option<&str>,
    ) -> Result<Operation>;
    async fn attach_disk(
        &self,
        zone: &str,
        instance: &str,
        spec: &AttachDiskSpec,
    ) -> Result<Operation>;
    async fn detach_disk(&self, zone: &str, instance: &str, device_name: &str)
    -> Result<Operation>;
    async fn set_disk_auto_delete(
        &self,
        zone: &str,
        instance: &str,
        device_name: &str,
        auto_delete: bool,
    ) -> Result<Operation>;

    // Network interfaces
    async fn add_access_config(
        &self,
        zone: &str,
        instance: &str,
        network_interface: &str,
        spec: &AccessConfigSpec,
    ) -> Result<Operation>;
    async fn delete_access_config(
        &self,
        zone: &str,
        instance: &str,
        network_interface: &str,
        access_config: &str,
    ) -> Result<Operation>;

    // Zone operations
    async fn get_operation(&self, zone: &str, name: &str) -> Result<Operation>;
    /// Blocks on the provider side until the operation is done or the
    /// provider's own deadline passes
    async fn wait_operation(&self, zone: &str, name: &str) -> Result<Operation>;

    // Kubernetes Engine
    async fn list_clusters(&self, location: &str) -> Result<ClusterList>;
    async fn get_cluster(&self, location: &str, name: &str) -> Result<Cluster>;
    async fn create_cluster(&self, location: &str, spec: &ClusterSpec)
    -> Result<ClusterOperation>;
    async fn delete_cluster(&self, location: &str, name: &str) -> Result<ClusterOperation>;
    async fn list_node_pools(&self, location: &str, cluster: &str) -> Result<NodePoolList>;
    async fn create_node_pool(
        &self,
        location: &str,
        cluster: &str,
        spec: &NodePoolSpec,
    ) -> Result<ClusterOperation>;
    async fn delete_node_pool(
        &self,
        location: &str,
        cluster: &str,
        node_pool: &str,
    ) -> Result<ClusterOperation>;
    async fn set_node_pool_size(
        &self,
        location: &str,
        cluster: &str,
        node_pool: &str,
        node_count: u32,
    ) -> Result<ClusterOperation>;
}
