//! REST implementation of [`ComputeApi`]
//!
//! Talks to the Compute Engine v1 and Kubernetes Engine v1 JSON APIs with a
//! bearer token from a [`TokenSource`]. Every method issues exactly one HTTP
//! request.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::api::ComputeApi;
use crate::auth::TokenSource;
use crate::models::{
    AccessConfigSpec, AttachDiskSpec, Cluster, ClusterList, ClusterOperation, ClusterSpec,
    DEFAULT_NETWORK, Disk, DiskList, DiskSpec, Instance, InstanceList, InstanceSpec, Labels,
    NodePoolList, NodePoolSpec, Operation,
};
use crate::{Error, Result};

pub const COMPUTE_BASE_URL: &str = "https://compute.googleapis.com/compute/v1";
pub const CONTAINER_BASE_URL: &str = "https://container.googleapis.com/v1";

/// Scopes granted to Kubernetes Engine nodes created through this client
const NODE_OAUTH_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/devstorage.read_only",
    "https://www.googleapis.com/auth/logging.write",
    "https://www.googleapis.com/auth/monitoring",
    "https://www.googleapis.com/auth/servicecontrol",
    "https://www.googleapis.com/auth/service.management.readonly",
    "https://www.googleapis.com/auth/trace.append",
];

/// Compute Engine client bound to one project
pub struct GcpClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    project_id: String,
    compute_base: String,
    container_base: String,
}

impl GcpClient {
    pub fn new(
        project_id: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            http,
            tokens,
            project_id: project_id.into(),
            compute_base: COMPUTE_BASE_URL.to_string(),
            container_base: CONTAINER_BASE_URL.to_string(),
        }
    }

    /// Point the client at different API roots (used against local fakes)
    pub fn with_base_urls(
        mut self,
        compute_base: impl Into<String>,
        container_base: impl Into<String>,
    ) -> Self {
        self.compute_base = compute_base.into().trim_end_matches('/').to_string();
        self.container_base = container_base.into().trim_end_matches('/').to_string();
        self
    }

    fn zone_url(&self, zone: &str, segments: &[&str]) -> Result<Url> {
        build_url(
            &self.compute_base,
            &["projects", &self.project_id, "zones", zone],
            segments,
        )
    }

    fn location_url(&self, location: &str, segments: &[&str]) -> Result<Url> {
        build_url(
            &self.container_base,
            &["projects", &self.project_id, "locations", location],
            segments,
        )
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<T> {
        let token = self.tokens.token().await?;

        tracing::debug!(%method, %url, "Calling Google API");

        let mut request = self.http.request(method.clone(), url.clone()).bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = provider_error(status, &text);
            tracing::warn!(%method, %url, status = status.as_u16(), error = %err, "Google API call failed");
            return Err(err);
        }

        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T> {
        self.call(Method::GET, url, query, None).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<T> {
        self.call(Method::POST, url, query, body).await
    }

    async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        self.call(Method::DELETE, url, &[], None).await
    }
}

/// Append `scope` then `segments` to `base`, one percent-encoded path
/// segment per value. Names are never parsed as URL syntax, so `/`, `?` and
/// `#` stay inside their segment and empty or dot segments are refused.
pub fn build_url(base: &str, scope: &[&str], segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| Error::InvalidPath(format!("{}: {}", base, e)))?;
    if let Some(bad) = scope
        .iter()
        .chain(segments)
        .find(|s| matches!(**s, "" | "." | ".."))
    {
        return Err(Error::InvalidPath(format!(
            "{:?} is not a usable resource name",
            bad
        )));
    }
    url.path_segments_mut()
        .map_err(|_| Error::InvalidPath(format!("{} cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(scope.iter().chain(segments));
    Ok(url)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Build a provider error from a failed response, keeping the provider's message
pub fn provider_error(status: StatusCode, body: &str) -> Error {
    let canonical = status.canonical_reason().unwrap_or("error").to_string();
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => Error::Provider {
            status: status.as_u16(),
            reason: envelope.error.status.unwrap_or(canonical),
            message: envelope.error.message.unwrap_or_default(),
        },
        Err(_) => Error::Provider {
            status: status.as_u16(),
            reason: canonical,
            message: body.trim().to_string(),
        },
    }
}

fn zonal_path(zone: &str, collection: &str, value: &str) -> String {
    if value.contains('/') {
        value.to_string()
    } else {
        format!("zones/{}/{}/{}", zone, collection, value)
    }
}

/// Request body for `instances.insert`
pub fn instance_body(zone: &str, spec: &InstanceSpec) -> Value {
    let mut initialize_params = json!({ "sourceImage": spec.source_image });
    if let Some(size) = spec.disk_size_gb {
        initialize_params["diskSizeGb"] = json!(size.to_string());
    }

    let mut network_interface = json!({
        "network": spec.network.as_deref().unwrap_or(DEFAULT_NETWORK),
    });
    if let Some(subnetwork) = &spec.subnetwork {
        network_interface["subnetwork"] = json!(subnetwork);
    }
    if spec.external_ip {
        network_interface["accessConfigs"] = json!([{
            "type": "ONE_TO_ONE_NAT",
            "name": crate::models::DEFAULT_ACCESS_CONFIG_NAME,
        }]);
    }

    let mut body = json!({
        "name": spec.name,
        "machineType": zonal_path(zone, "machineTypes", &spec.machine_type),
        "disks": [{
            "boot": true,
            "autoDelete": true,
            "initializeParams": initialize_params,
        }],
        "networkInterfaces": [network_interface],
    });
    if !spec.labels.is_empty() {
        body["labels"] = json!(spec.labels);
    }
    if !spec.metadata.is_empty() {
        body["metadata"] = json!({ "items": metadata_items(&spec.metadata) });
    }
    body
}

/// Request body for `disks.insert`
pub fn disk_body(zone: &str, spec: &DiskSpec) -> Value {
    let mut body = json!({
        "name": spec.name,
        "sizeGb": spec.size_gb.to_string(),
    });
    if let Some(disk_type) = &spec.disk_type {
        body["type"] = json!(zonal_path(zone, "diskTypes", disk_type));
    }
    if let Some(image) = &spec.source_image {
        body["sourceImage"] = json!(image);
    }
    if !spec.labels.is_empty() {
        body["labels"] = json!(spec.labels);
    }
    body
}

/// Request body for `instances.attachDisk`
pub fn attach_disk_body(project_id: &str, zone: &str, spec: &AttachDiskSpec) -> Value {
    let source = if spec.source.contains('/') {
        spec.source.clone()
    } else {
        format!("projects/{}/zones/{}/disks/{}", project_id, zone, spec.source)
    };

    let mut body = json!({ "source": source });
    if let Some(device_name) = &spec.device_name {
        body["deviceName"] = json!(device_name);
    }
    if let Some(mode) = &spec.mode {
        body["mode"] = json!(mode);
    }
    if let Some(auto_delete) = spec.auto_delete {
        body["autoDelete"] = json!(auto_delete);
    }
    if let Some(boot) = spec.boot {
        body["boot"] = json!(boot);
    }
    body
}

/// Request body for `instances.addAccessConfig`
pub fn access_config_body(spec: &AccessConfigSpec) -> Value {
    let mut body = json!({
        "type": "ONE_TO_ONE_NAT",
        "name": spec.name,
    });
    if let Some(nat_ip) = &spec.nat_ip {
        body["natIP"] = json!(nat_ip);
    }
    if let Some(tier) = &spec.network_tier {
        body["networkTier"] = json!(tier);
    }
    body
}

fn metadata_items(items: &BTreeMap<String, String>) -> Vec<Value> {
    items
        .iter()
        .map(|(k, v)| json!({ "key": k, "value": v }))
        .collect()
}

fn labels_body(labels: &Labels, fingerprint: Option<&str>) -> Value {
    let mut body = json!({ "labels": labels });
    if let Some(fp) = fingerprint {
        body["labelFingerprint"] = json!(fp);
    }
    body
}

fn page_query(page_token: Option<&str>) -> Vec<(&'static str, String)> {
    page_token
        .map(|t| vec![("pageToken", t.to_string())])
        .unwrap_or_default()
}

/// Request body for `clusters.create`
pub fn cluster_body(spec: &ClusterSpec) -> Value {
    let mut cluster = json!({ "name": spec.name });
    if spec.autopilot {
        cluster["autopilot"] = json!({ "enabled": true });
    } else if let Some(pool) = &spec.node_pool {
        cluster["nodePools"] = json!([node_pool_config(pool)]);
    }
    if let Some(network) = &spec.network {
        cluster["network"] = json!(network);
    }
    if let Some(subnetwork) = &spec.subnetwork {
        cluster["subnetwork"] = json!(subnetwork);
    }
    if spec.pod_ipv4_cidr.is_some() || spec.services_ipv4_cidr.is_some() {
        let mut policy = json!({ "useIpAliases": true });
        if let Some(cidr) = &spec.pod_ipv4_cidr {
            policy["clusterIpv4CidrBlock"] = json!(cidr);
        }
        if let Some(cidr) = &spec.services_ipv4_cidr {
            policy["servicesIpv4CidrBlock"] = json!(cidr);
        }
        cluster["ipAllocationPolicy"] = policy;
    }
    if let Some(cidr) = &spec.master_ipv4_cidr {
        cluster["privateClusterConfig"] = json!({
            "enablePrivateNodes": true,
            "enablePrivateEndpoint": false,
            "masterIpv4CidrBlock": cidr,
        });
    }
    if let Some(version) = &spec.kubernetes_version {
        cluster["initialClusterVersion"] = json!(version);
    }
    if !spec.labels.is_empty() {
        cluster["resourceLabels"] = json!(spec.labels);
    }
    json!({ "cluster": cluster })
}

/// Request body for `nodePools.create`
pub fn node_pool_body(spec: &NodePoolSpec) -> Value {
    json!({ "nodePool": node_pool_config(spec) })
}

fn node_pool_config(spec: &NodePoolSpec) -> Value {
    let mut pool = json!({
        "name": spec.name,
        "initialNodeCount": spec.node_count,
        "config": {
            "machineType": spec.machine_type,
            "diskSizeGb": spec.disk_size_gb,
            "diskType": spec.disk_type,
            "oauthScopes": NODE_OAUTH_SCOPES,
        },
    });
    if !spec.node_labels.is_empty() {
        pool["config"]["labels"] = json!(spec.node_labels);
    }
    if let Some((min, max)) = spec.autoscaling {
        pool["autoscaling"] = json!({
            "enabled": true,
            "minNodeCount": min,
            "maxNodeCount": max,
        });
    }
    pool
}

#[async_trait]
impl ComputeApi for GcpClient {
    async fn list_instances(&self, zone: &str, page_token: Option<&str>) -> Result<InstanceList> {
        self.get(self.zone_url(zone, &["instances"])?, &page_query(page_token))
            .await
    }

    async fn get_instance(&self, zone: &str, name: &str) -> Result<Instance> {
        self.get(self.zone_url(zone, &["instances", name])?, &[])
            .await
    }

    async fn insert_instance(&self, zone: &str, spec: &InstanceSpec) -> Result<Operation> {
        tracing::info!(zone, name = %spec.name, machine_type = %spec.machine_type, "Creating instance");
        self.post(
            self.zone_url(zone, &["instances"])?,
            &[],
            Some(instance_body(zone, spec)),
        )
        .await
    }

    async fn delete_instance(&self, zone: &str, name: &str) -> Result<Operation> {
        tracing::info!(zone, name, "Deleting instance");
        self.delete(self.zone_url(zone, &["instances", name])?).await
    }

    async fn start_instance(&self, zone: &str, name: &str) -> Result<Operation> {
        tracing::info!(zone, name, "Starting instance");
        self.post(self.zone_url(zone, &["instances", name, "start"])?, &[], None)
            .await
    }

    async fn stop_instance(&self, zone: &str, name: &str) -> Result<Operation> {
        tracing::info!(zone, name, "Stopping instance");
        self.post(self.zone_url(zone, &["instances", name, "stop"])?, &[], None)
            .await
    }

    async fn set_instance_labels(
        &self,
        zone: &str,
        name: &str,
        labels: &Labels,
        fingerprint: Option<&str>,
    ) -> Result<Operation> {
        self.post(
            self.zone_url(zone, &["instances", name, "setLabels"])?,
            &[],
            Some(labels_body(labels, fingerprint)),
        )
        .await
    }

    async fn set_instance_metadata(
        &self,
        zone: &str,
        name: &str,
        items: &BTreeMap<String, String>,
        fingerprint: Option<&str>,
    ) -> Result<Operation> {
        let mut body = json!({ "items": metadata_items(items) });
        if let Some(fp) = fingerprint {
            body["fingerprint"] = json!(fp);
        }
        self.post(
            self.zone_url(zone, &["instances", name, "setMetadata"])?,
            &[],
            Some(body),
        )
        .await
    }

    async fn set_machine_type(
        &self,
        zone: &str,
        name: &str,
        machine_type: &str,
    ) -> Result<Operation> {
        tracing::info!(zone, name, machine_type, "Changing machine type");
        self.post(
            self.zone_url(zone, &["instances", name, "setMachineType"])?,
            &[],
            Some(json!({ "machineType": zonal_path(zone, "machineTypes", machine_type) })),
        )
        .await
    }

    async fn list_disks(&self, zone: &str, page_token: Option<&str>) -> Result<DiskList> {
        self.get(self.zone_url(zone, &["disks"])?, &page_query(page_token))
            .await
    }

    async fn get_disk(&self, zone: &str, name: &str) -> Result<Disk> {
        self.get(self.zone_url(zone, &["disks", name])?, &[]).await
    }

    async fn insert_disk(&self, zone: &str, spec: &DiskSpec) -> Result<Operation> {
        tracing::info!(zone, name = %spec.name, size_gb = spec.size_gb, "Creating disk");
        self.post(
            self.zone_url(zone, &["disks"])?,
            &[],
            Some(disk_body(zone, spec)),
        )
        .await
    }

    async fn resize_disk(&self, zone: &str, name: &str, size_gb: u64) -> Result<Operation> {
        tracing::info!(zone, name, size_gb, "Resizing disk");
        self.post(
            self.zone_url(zone, &["disks", name, "resize"])?,
            &[],
            Some(json!({ "sizeGb": size_gb.to_string() })),
        )
        .await
    }

    async fn set_disk_labels(
        &self,
        zone: &str,
        name: &str,
        labels: &Labels,
        fingerprint: Option<&str>,
    ) -> Result<Operation> {
        self.post(
            self.zone_url(zone, &["disks", name, "setLabels"])?,
            &[],
            Some(labels_body(labels, fingerprint)),
        )
        .await
    }

    async fn attach_disk(
        &self,
        zone: &str,
        instance: &str,
        spec: &AttachDiskSpec,
    ) -> Result<Operation> {
        tracing::info!(zone, instance, source = %spec.source, "Attaching disk");
        self.post(
            self.zone_url(zone, &["instances", instance, "attachDisk"])?,
            &[],
            Some(attach_disk_body(&self.project_id, zone, spec)),
        )
        .await
    }

    async fn detach_disk(
        &self,
        zone: &str,
        instance: &str,
        device_name: &str,
    ) -> Result<Operation> {
        tracing::info!(zone, instance, device_name, "Detaching disk");
        self.post(
            self.zone_url(zone, &["instances", instance, "detachDisk"])?,
            &[("deviceName", device_name.to_string())],
            None,
        )
        .await
    }

    async fn set_disk_auto_delete(
        &self,
        zone: &str,
        instance: &str,
        device_name: &str,
        auto_delete: bool,
    ) -> Result<Operation> {
        self.post(
            self.zone_url(zone, &["instances", instance, "setDiskAutoDelete"])?,
            &[
                ("autoDelete", auto_delete.to_string()),
                ("deviceName", device_name.to_string()),
            ],
            None,
        )
        .await
    }

    async fn add_access_config(
        &self,
        zone: &str,
        instance: &str,
        network_interface: &str,
        spec: &AccessConfigSpec,
    ) -> Result<Operation> {
        tracing::info!(zone, instance, network_interface, "Adding access config");
        self.post(
            self.zone_url(zone, &["instances", instance, "addAccessConfig"])?,
            &[("networkInterface", network_interface.to_string())],
            Some(access_config_body(spec)),
        )
        .await
    }

    async fn delete_access_config(
        &self,
        zone: &str,
        instance: &str,
        network_interface: &str,
        access_config: &str,
    ) -> Result<Operation> {
        tracing::info!(zone, instance, network_interface, access_config, "Deleting access config");
        self.post(
            self.zone_url(zone, &["instances", instance, "deleteAccessConfig"])?,
            &[
                ("accessConfig", access_config.to_string()),
                ("networkInterface", network_interface.to_string()),
            ],
            None,
        )
        .await
    }

    async fn get_operation(&self, zone: &str, name: &str) -> Result<Operation> {
        self.get(self.zone_url(zone, &["operations", name])?, &[])
            .await
    }

    async fn wait_operation(&self, zone: &str, name: &str) -> Result<Operation> {
        self.post(self.zone_url(zone, &["operations", name, "wait"])?, &[], None)
            .await
    }

    async fn list_clusters(&self, location: &str) -> Result<ClusterList> {
        self.get(self.location_url(location, &["clusters"])?, &[])
            .await
    }

    async fn get_cluster(&self, location: &str, name: &str) -> Result<Cluster> {
        self.get(self.location_url(location, &["clusters", name])?, &[])
            .await
    }

    async fn create_cluster(
        &self,
        location: &str,
        spec: &ClusterSpec,
    ) -> Result<ClusterOperation> {
        tracing::info!(location, name = %spec.name, autopilot = spec.autopilot, "Creating cluster");
        self.post(
            self.location_url(location, &["clusters"])?,
            &[],
            Some(cluster_body(spec)),
        )
        .await
    }

    async fn delete_cluster(&self, location: &str, name: &str) -> Result<ClusterOperation> {
        tracing::info!(location, name, "Deleting cluster");
        self.delete(self.location_url(location, &["clusters", name])?)
            .await
    }

    async fn list_node_pools(&self, location: &str, cluster: &str) -> Result<NodePoolList> {
        self.get(
            self.location_url(location, &["clusters", cluster, "nodePools"])?,
            &[],
        )
        .await
    }

    async fn create_node_pool(
        &self,
        location: &str,
        cluster: &str,
        spec: &NodePoolSpec,
    ) -> Result<ClusterOperation> {
        tracing::info!(location, cluster, node_pool = %spec.name, node_count = spec.node_count, "Creating node pool");
        self.post(
            self.location_url(location, &["clusters", cluster, "nodePools"])?,
            &[],
            Some(node_pool_body(spec)),
        )
        .await
    }

    async fn delete_node_pool(
        &self,
        location: &str,
        cluster: &str,
        node_pool: &str,
    ) -> Result<ClusterOperation> {
        tracing::info!(location, cluster, node_pool, "Deleting node pool");
        self.delete(self.location_url(location, &["clusters", cluster, "nodePools", node_pool])?)
            .await
    }

    async fn set_node_pool_size(
        &self,
        location: &str,
        cluster: &str,
        node_pool: &str,
        node_count: u32,
    ) -> Result<ClusterOperation> {
        tracing::info!(location, cluster, node_pool, node_count, "Resizing node pool");
        let action = format!("{}:setSize", node_pool);
        self.post(
            self.location_url(location, &["clusters", cluster, "nodePools", &action])?,
            &[],
            Some(json!({ "nodeCount": node_count })),
        )
        .await
    }
}
