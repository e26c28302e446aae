//! Single-deal reconciliation and the periodic sweep over downloading deals.

use super::DealOrchestrator;
use super::mapper;
use crate::types::{Deal, DealStatus, DealUpdate, TaskHandle};
use tracing::{debug, error, warn};

/// Note written when a downloading deal has lost its task handle
pub const MISSING_TASK_HANDLE: &str = "download task handle not found for deal";

impl DealOrchestrator {
    /// Query `handle`'s status and apply at most one resulting deal write
    ///
    /// Never fails: engine, protocol and registry errors are logged so one
    /// misbehaving deal cannot halt a sweep.
    pub async fn reconcile(&self, deal: &Deal, handle: &TaskHandle) {
        let raw = match self.engine.task_status(handle).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(deal_id = %deal.id, %handle, error = %e, "Failed to query task status");
                return;
            }
        };

        let decision = match mapper::map_status(&raw, deal, handle, self.probe.as_ref()) {
            Ok(decision) => decision,
            Err(e) => {
                error!(deal_id = %deal.id, %handle, error = %e, "Unusable task status response");
                return;
            }
        };

        if let Some(update) = decision.into_update(deal.id) {
            self.apply(update).await;
        }
    }

    /// Reconcile every deal the registry reports as downloading, in registry order
    pub async fn reconcile_sweep(&self) {
        let deals = match self
            .registry
            .list_deals(&self.provider_id, &[DealStatus::Downloading], None)
            .await
        {
            Ok(deals) => deals,
            Err(e) => {
                error!(error = %e, "Failed to list downloading deals");
                return;
            }
        };

        debug!(count = deals.len(), "Reconciling downloading deals");

        for deal in &deals {
            match &deal.task_handle {
                Some(handle) => self.reconcile(deal, handle).await,
                None => {
                    warn!(deal_id = %deal.id, "{}", MISSING_TASK_HANDLE);
                    if deal.note_str() != MISSING_TASK_HANDLE {
                        self.apply(DealUpdate::failed(deal.id, MISSING_TASK_HANDLE))
                            .await;
                    }
                }
            }
        }
    }
}
