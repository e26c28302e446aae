//! # offline-deal-dl
//!
//! Download orchestrator for offline storage deals, driving an aria2 daemon.
//!
//! ## Overview
//!
//! A storage provider receives offline deals whose payload must be fetched
//! from a source URL before the deal can be imported. This crate:
//! - **Admits** new downloads while keeping the number of concurrent engine
//!   tasks under a configured ceiling
//! - **Reconciles** each downloading deal against the engine's task status and
//!   writes the resulting deal status back to the registry
//! - **Fails loudly** through the deal itself: every problem ends in a log line
//!   or a status note an operator can read
//!
//! The deal registry is the only store of deal state; nothing is persisted
//! locally.
//!
//! ## Quick Start
//!
//! ```no_run
//! use offline_deal_dl::{Config, DealOrchestrator, run_with_shutdown};
//! use offline_deal_dl::scheduler_task::PollingTask;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("offline-deal-dl.toml".as_ref())?;
//!     config.validate()?;
//!
//!     let orchestrator = DealOrchestrator::from_config(&config)?;
//!     let task = PollingTask::new(orchestrator, config.orchestrator.poll_interval);
//!
//!     // Poll until SIGTERM / Ctrl+C
//!     run_with_shutdown(task).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Download engine client and status payloads
pub mod engine;
/// Error types
pub mod error;
/// Logging setup for the daemon
pub mod logging;
/// Deal reconciliation and download admission
pub mod orchestrator;
/// Deal registry client
pub mod registry;
/// Periodic polling driver
pub mod scheduler_task;
/// Core deal types
pub mod types;
/// Filesystem helpers
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use engine::{Aria2Client, DownloadEngine, DownloadOption};
pub use error::{Error, Result};
pub use orchestrator::DealOrchestrator;
pub use registry::{DealRegistry, RegistryClient};
pub use scheduler_task::{IntervalSchedule, PollingTask, TickSchedule};
pub use types::{Deal, DealId, DealStatus, DealUpdate, TaskHandle};

/// Run a polling task until a termination signal arrives.
///
/// On the signal the task's shutdown token is cancelled and the task is awaited,
/// so a tick already in progress completes. Returns early if the task ends on
/// its own.
///
/// On unix either SIGTERM or SIGINT stops polling; elsewhere Ctrl+C does. If no
/// handler can be installed the daemon keeps polling until it is killed.
pub async fn run_with_shutdown<S>(task: PollingTask<S>) -> Result<()>
where
    S: TickSchedule + 'static,
{
    let shutdown = task.shutdown_token();
    let mut handle = tokio::spawn(task.run());

    tokio::select! {
        joined = &mut handle => {
            return joined.map_err(|e| Error::Other(format!("polling task failed: {e}")));
        }
        () = wait_for_signal() => {}
    }

    shutdown.cancel();
    handle
        .await
        .map_err(|e| Error::Other(format!("polling task failed: {e}")))
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let terminate = signal(SignalKind::terminate());
    let interrupt = signal(SignalKind::interrupt());

    match (terminate, interrupt) {
        (Ok(mut terminate), Ok(mut interrupt)) => {
            let name = tokio::select! {
                _ = terminate.recv() => "SIGTERM",
                _ = interrupt.recv() => "SIGINT",
            };
            tracing::info!(signal = name, "Stopping deal polling");
        }
        (Ok(mut terminate), Err(e)) => {
            tracing::warn!(error = %e, "SIGINT unavailable, deal polling stops on SIGTERM only");
            terminate.recv().await;
            tracing::info!(signal = "SIGTERM", "Stopping deal polling");
        }
        (Err(e), Ok(mut interrupt)) => {
            tracing::warn!(error = %e, "SIGTERM unavailable, deal polling stops on SIGINT only");
            interrupt.recv().await;
            tracing::info!(signal = "SIGINT", "Stopping deal polling");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "No unix signal handlers, deal polling stops on Ctrl+C");
            ctrl_c_or_forever().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c_or_forever().await;
}

/// Resolves on Ctrl+C; never resolves if the handler cannot be installed
async fn ctrl_c_or_forever() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!(signal = "ctrl_c", "Stopping deal polling"),
        Err(e) => {
            tracing::error!(error = %e, "Ctrl+C handler unavailable, deal polling runs until killed");
            std::future::pending::<()>().await;
        }
    }
}
