//! Logging init for the daemon: structured `tracing` output on stderr.

use crate::error::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparseable
pub const DEFAULT_FILTER: &str = "info,offline_deal_dl=debug";

/// Install the global `tracing` subscriber
///
/// Honors `RUST_LOG`, falling back to [`DEFAULT_FILTER`]. Fails if a global
/// subscriber is already set.
pub fn init_logging() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|e| Error::Other(format!("failed to install log subscriber: {e}")))?;

    tracing::debug!(filter = DEFAULT_FILTER, "Logging initialized");
    Ok(())
}
