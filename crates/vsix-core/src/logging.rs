use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize a tracing subscriber with default configuration.
///
/// Logs go to stderr: stdout carries command output and, inside an isolated
/// boundary, the protocol stream. The level comes from `RUST_LOG`, defaulting
/// to "warn" if not set.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
