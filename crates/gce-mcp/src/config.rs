//! Startup configuration
//!
//! Read once from the process environment. `main` loads a `.env` file first
//! when one is present.

use std::path::PathBuf;

use crate::{Error, Result};

pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";
pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Project every provider call is scoped to
    pub project_id: String,
    /// Service-account key file
    pub credentials_path: PathBuf,
    /// Default region for GKE tools
    pub region: String,
    /// Default zone for Compute Engine tools
    pub zone: String,
    /// Bind address of the SSE transport
    pub host: String,
    pub port: u16,
    /// Level name from `LOG_LEVEL`, e.g. `INFO`
    pub log_level: String,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let project_id = get("GCP_PROJECT_ID")
            .ok_or_else(|| Error::Config("GCP_PROJECT_ID must be set".to_string()))?;
        let credentials_path = get("GCP_CREDENTIALS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH));
        let region = get("GCP_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string());
        let zone = get("GCP_ZONE").unwrap_or_else(|| format!("{}-a", region));
        let host = get("MCP_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get("MCP_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("MCP_PORT is not a valid port: {}", raw)))?,
            None => DEFAULT_PORT,
        };
        let log_level = get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            project_id,
            credentials_path,
            region,
            zone,
            host,
            port,
            log_level,
        })
    }

    /// Apply `--host` / `--port` overrides
    pub fn with_bind(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// `host:port` for the SSE listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
