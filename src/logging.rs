use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::core::Result;

/// Installs a stderr subscriber filtered by `RUST_LOG`, or by `default_directive` when
/// `RUST_LOG` is not set. Fails if a global subscriber is already installed.
pub fn init_logging(default_directive: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .map_err(anyhow::Error::from)?;
    Ok(())
}
