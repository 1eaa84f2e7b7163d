//! Google Compute Engine resource client
//!
//! A thin facade over the Compute Engine v1 and Kubernetes Engine v1 REST
//! APIs used by the `gce-mcp` server:
//!
//! ```text
//! [ gce-mcp handlers ]
//!        | (ComputeApi trait)
//!        v
//! [ GcpClient ] --(bearer token from TokenSource)--> compute.googleapis.com
//!                                                    container.googleapis.com
//! ```
//!
//! Each [`ComputeApi`] method maps to one provider call. There is no retry
//! and no local resource state; provider errors come back as
//! [`Error::Provider`] with the provider's message intact. The [`workflow`]
//! module sequences calls for operations the provider splits into steps
//! (restart, machine-type change, create-and-attach disk).

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod workflow;

pub use api::ComputeApi;
pub use auth::{ServiceAccountKey, ServiceAccountTokenSource, StaticToken, TokenSource};
pub use client::GcpClient;
pub use error::{Error, Result};
pub use models::{
    AccessConfig, AccessConfigSpec, AttachDiskSpec, AttachedDisk, Cluster, ClusterList,
    ClusterOperation, ClusterSpec, Disk, DiskList, DiskSpec, Instance, InstanceList,
    InstanceSpec, Labels, Metadata, MetadataItem, NetworkInterface, NodePool, NodePoolList,
    NodePoolSpec, Operation,
};
