//! Deal download orchestrator split into focused submodules.
//!
//! - [`mapper`] - Engine status → deal decision
//! - [`reconcile`] - Single-deal reconciliation and the downloading-deal sweep
//! - [`admission`] - Concurrency-capped selection of deals to start
//! - [`starter`] - Destination layout and engine task creation
//!
//! Every public entry point returns `()`: failures end in a log line or a
//! deal status write, never in an error for the driver.

pub mod mapper;

mod admission;
mod reconcile;
mod starter;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use mapper::{Decision, FileInfo};
pub use starter::download_option;

use crate::config::Config;
use crate::engine::{Aria2Client, DownloadEngine};
use crate::error::Result;
use crate::registry::{DealRegistry, RegistryClient};
use crate::types::DealUpdate;
use crate::utils::{DiskProbe, FileProbe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Reconciles offline deals against the download engine (cloneable - all shared state is Arc-wrapped)
#[derive(Clone)]
pub struct DealOrchestrator {
    /// Deal registry (single writer of deal state)
    pub(crate) registry: Arc<dyn DealRegistry>,
    /// Download engine
    pub(crate) engine: Arc<dyn DownloadEngine>,
    /// On-disk size lookups
    pub(crate) probe: Arc<dyn FileProbe>,
    /// Provider identity scoping every registry query
    pub(crate) provider_id: String,
    /// Base output directory
    pub(crate) download_dir: PathBuf,
    /// Admission ceiling
    pub(crate) max_concurrent_downloads: usize,
    /// Delay between consecutive starts
    pub(crate) start_pacing: Duration,
}

impl DealOrchestrator {
    /// Create an orchestrator over the given collaborators
    ///
    /// On-disk sizes are read from the local filesystem; use
    /// [`with_file_probe`](Self::with_file_probe) to replace that.
    pub fn new(
        config: &Config,
        registry: Arc<dyn DealRegistry>,
        engine: Arc<dyn DownloadEngine>,
    ) -> Self {
        Self {
            registry,
            engine,
            probe: Arc::new(DiskProbe),
            provider_id: config.provider.provider_id.clone(),
            download_dir: config.engine.download_dir.clone(),
            max_concurrent_downloads: config.orchestrator.max_concurrent_downloads,
            start_pacing: config.orchestrator.start_pacing,
        }
    }

    /// Create an orchestrator with the HTTP registry and aria2 clients from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = Arc::new(RegistryClient::new(&config.registry)?);
        let engine = Arc::new(Aria2Client::new(&config.engine)?);
        Ok(Self::new(config, registry, engine))
    }

    /// Replace the on-disk size lookup
    pub fn with_file_probe(mut self, probe: Arc<dyn FileProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Provider identity this orchestrator acts for
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Issue one registry write; failures are logged, not propagated
    pub(crate) async fn apply(&self, update: DealUpdate) {
        if let Err(e) = self.registry.update_deal_status(&update).await {
            tracing::error!(
                deal_id = %update.deal_id,
                status = %update.status,
                error = %e,
                "Failed to update deal status"
            );
        }
    }
}
