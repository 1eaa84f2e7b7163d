//! MCP Server for Google Compute Engine
//!
//! This crate exposes Compute Engine (and a slice of Kubernetes Engine)
//! management via the Model Context Protocol, so AI assistants can create,
//! inspect and change VM instances, disks and network interfaces.
//!
//! # Architecture
//!
//! ```text
//! [ MCP Client (assistant) ]
//!        | (JSON-RPC over stdio or SSE)
//!        v
//! [ gce-mcp: server -> registry -> handlers ]
//!        | (ComputeApi trait)
//!        v
//! [ gce-compute: GcpClient ] --> Google Cloud REST APIs
//! ```
//!
//! Each `tools/call` is looked up by name, checked for required arguments,
//! and forwarded as one client call (or one multi-step workflow). Unknown
//! tools and bad arguments are JSON-RPC errors; provider failures come back
//! as tool results with `isError` set and the provider's message intact.
//!
//! # Tools
//!
//! See [`tools`] for the full list: instance lifecycle, disks, network
//! access configs, zone operations, and GKE clusters and node pools.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod sse;
pub mod tools;

pub use config::Config;
pub use error::{Error, Result};
pub use handlers::{ToolContext, handle_tool_call};
pub use registry::ToolRegistry;
pub use server::GceMcpServer;
pub use tools::{ToolContent, ToolDefinition, ToolResult, get_tool_definitions};
