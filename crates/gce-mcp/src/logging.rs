use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Map a `LOG_LEVEL` name to a tracing filter directive.
///
/// Accepts `DEBUG`, `INFO`, `WARNING`/`WARN`, `ERROR` and `CRITICAL`
/// (case-insensitive); anything else falls back to `info`.
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// Initialize a tracing subscriber writing to stderr.
///
/// stdout carries the stdio transport, so nothing else may write there.
/// `RUST_LOG` wins when set; otherwise the level comes from `log_level`.
pub fn init(log_level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level_directive(log_level)))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
