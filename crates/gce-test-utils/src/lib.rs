//! Shared test utilities for the gce-mcp workspace.
//!
//! This crate provides a recording stand-in for the Compute Engine client so
//! dispatch and workflow tests can run without network access. It is a
//! dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`mock`]: [`MockCompute`], a [`gce_compute::ComputeApi`] that records
//!   every call and replies from a queue or a sensible default
//! - [`fixtures`]: provider-shaped JSON documents from `test-fixtures/gcp`

pub mod fixtures;
pub mod mock;

pub use mock::{MockCompute, RecordedCall};
