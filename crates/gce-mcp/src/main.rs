//! GCE Manager MCP Server
//!
//! A Model Context Protocol server that lets AI assistants manage Google
//! Compute Engine instances, disks and network interfaces.
//!
//! # Usage
//!
//! ```bash
//! gce-mcp [--transport stdio|sse] [--host <host>] [--port <port>]
//! ```
//!
//! # Environment Variables
//!
//! - `GCP_PROJECT_ID` (required), `GCP_CREDENTIALS_PATH`, `GCP_REGION`, `GCP_ZONE`
//! - `MCP_HOST`, `MCP_PORT`: SSE bind address, overridden by `--host`/`--port`
//! - `LOG_LEVEL`, or `RUST_LOG` for full filter control
//!
//! A `.env` file in the working directory is loaded first.
//!
//! # Protocol
//!
//! With `--transport stdio` requests and responses go through stdin/stdout
//! and logs go to stderr. With `--transport sse` clients connect to
//! `GET /sse` and post messages to the announced endpoint.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use gce_compute::{GcpClient, ServiceAccountTokenSource};
use gce_mcp::{Config, GceMcpServer, ToolContext, logging, sse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// HTTP with Server-Sent Events
    Sse,
}

/// MCP server for Google Compute Engine
#[derive(Parser)]
#[command(name = "gce-mcp")]
#[command(about = "MCP server for Google Compute Engine")]
#[command(version)]
struct Args {
    /// Transport to serve the protocol on
    #[arg(long, value_enum, default_value = "stdio")]
    transport: Transport,

    /// Bind host for the SSE transport (overrides MCP_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port for the SSE transport (overrides MCP_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv::dotenv().ok();

    let config = Config::from_env()?.with_bind(args.host, args.port);
    logging::init(&config.log_level)?;

    tracing::info!(
        project = %config.project_id,
        zone = %config.zone,
        transport = ?args.transport,
        "Starting gce-mcp server"
    );

    let http = reqwest::Client::new();
    let tokens = ServiceAccountTokenSource::from_file(&config.credentials_path, http.clone())?;
    let client = GcpClient::new(config.project_id.clone(), Arc::new(tokens), http);

    let context = ToolContext::new(Arc::new(client), config.zone.clone(), config.region.clone());
    let mut server = GceMcpServer::new(context);
    server.initialize().await?;

    match args.transport {
        Transport::Stdio => server.run_stdio().await?,
        Transport::Sse => sse::serve(Arc::new(server), &config.bind_address()).await?,
    }

    Ok(())
}
