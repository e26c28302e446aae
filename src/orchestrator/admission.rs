//! Download admission: caps concurrent downloads and starts the next deals.

use super::DealOrchestrator;
use super::starter::StartOutcome;
use crate::error::Result;
use crate::types::{Deal, DealStatus};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

impl DealOrchestrator {
    /// Start up to `limit - downloading` new downloads
    ///
    /// Created deals are preferred over waiting ones; the registry's query
    /// order decides among deals of the same status. Starts are spaced by
    /// the configured pacing delay.
    pub async fn admission_tick(&self) {
        let downloading = match self
            .registry
            .list_deals(&self.provider_id, &[DealStatus::Downloading], None)
            .await
        {
            Ok(deals) => deals.len(),
            Err(e) => {
                error!(error = %e, "Failed to count downloading deals");
                return;
            }
        };

        if downloading >= self.max_concurrent_downloads {
            debug!(
                downloading,
                limit = self.max_concurrent_downloads,
                "Download slots full"
            );
            return;
        }

        let slots = self.max_concurrent_downloads - downloading;
        let mut attempted = HashSet::new();

        for attempt in 0..slots {
            let deal = match self.next_eligible_deal().await {
                Ok(Some(deal)) => deal,
                Ok(None) => {
                    debug!("No deals waiting to download");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Failed to select next deal");
                    break;
                }
            };

            // A deal still eligible after its own start means the first reconcile did not land.
            if !attempted.insert(deal.id) {
                warn!(deal_id = %deal.id, "Deal still eligible after start, ending tick");
                break;
            }

            if attempt > 0 {
                tokio::time::sleep(self.start_pacing).await;
            }

            if self.start_deal(&deal).await == StartOutcome::EngineUnavailable {
                break;
            }
        }

        info!(attempted = attempted.len(), slots, "Admission tick finished");
    }

    /// Oldest created deal, else oldest waiting deal
    pub(crate) async fn next_eligible_deal(&self) -> Result<Option<Deal>> {
        for status in [DealStatus::Created, DealStatus::Waiting] {
            let deals = self
                .registry
                .list_deals(&self.provider_id, &[status], Some(1))
                .await?;
            if let Some(deal) = deals.into_iter().find(|d| d.status.is_eligible_for_start()) {
                return Ok(Some(deal));
            }
        }
        Ok(None)
    }
}
