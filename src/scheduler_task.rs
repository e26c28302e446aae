//! Periodic polling driver for the deal orchestrator
//!
//! Each tick runs the reconciliation sweep and then one admission pass, in
//! that order, so the slot count seen by admission already reflects deals
//! the sweep just finished or failed. Ticks never overlap: the next one is
//! awaited only after the current one returns.
//!
//! # Example
//!
//! ```no_run
//! use offline_deal_dl::{Config, DealOrchestrator};
//! use offline_deal_dl::scheduler_task::PollingTask;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("offline-deal-dl.toml".as_ref())?;
//! let orchestrator = DealOrchestrator::from_config(&config)?;
//! let task = PollingTask::new(orchestrator, config.orchestrator.poll_interval);
//!
//! let shutdown = task.shutdown_token();
//! let handle = tokio::spawn(task.run());
//! // ... later
//! shutdown.cancel();
//! handle.await?;
//! # Ok(())
//! # }
//! ```

use crate::orchestrator::DealOrchestrator;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Source of polling ticks
#[async_trait]
pub trait TickSchedule: Send + Sync {
    /// Wait for the next tick; `false` ends the polling loop
    async fn next_tick(&mut self) -> bool;
}

/// Fixed-period schedule; the first tick fires immediately
pub struct IntervalSchedule {
    interval: Interval,
}

impl IntervalSchedule {
    /// Tick every `period`
    ///
    /// A tick that runs longer than `period` delays the following ones
    /// instead of triggering a burst of catch-up ticks.
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl TickSchedule for IntervalSchedule {
    async fn next_tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Background task that drives the orchestrator until cancelled
pub struct PollingTask<S = IntervalSchedule> {
    orchestrator: DealOrchestrator,
    schedule: S,
    shutdown: CancellationToken,
}

impl PollingTask<IntervalSchedule> {
    /// Poll every `poll_interval`
    pub fn new(orchestrator: DealOrchestrator, poll_interval: Duration) -> Self {
        Self::with_schedule(orchestrator, IntervalSchedule::new(poll_interval))
    }
}

impl<S: TickSchedule> PollingTask<S> {
    /// Poll on a custom schedule
    pub fn with_schedule(orchestrator: DealOrchestrator, schedule: S) -> Self {
        Self {
            orchestrator,
            schedule,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops [`run`](Self::run) once cancelled
    ///
    /// Cancellation is observed between ticks; a tick already in progress
    /// completes first.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// One sweep followed by one admission pass
    pub async fn tick(&self) {
        self.orchestrator.reconcile_sweep().await;
        self.orchestrator.admission_tick().await;
    }

    /// Run ticks until the schedule ends or shutdown is requested
    pub async fn run(mut self) {
        info!(provider_id = %self.orchestrator.provider_id(), "Polling task started");

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("Polling task shutting down");
                    break;
                }
                more = self.schedule.next_tick() => {
                    if !more {
                        debug!("Tick schedule exhausted");
                        break;
                    }
                }
            }

            debug!("Polling tick");
            self.tick().await;
        }

        info!("Polling task stopped");
    }
}
