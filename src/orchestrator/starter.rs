//! Download starter: destination layout and engine task creation.

use super::DealOrchestrator;
use crate::engine::DownloadOption;
use crate::error::Error;
use crate::types::{Deal, DealUpdate, TaskHandle};
use crate::utils::{final_component, remove_stale_file};
use chrono::{Datelike, Local};
use std::path::Path;
use tracing::{error, info, warn};
use url::Url;

/// How a start attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StartOutcome {
    /// Task created and reconciled once
    Started(TaskHandle),
    /// Deal marked failed before or at task creation
    Rejected,
    /// Engine could not be reached or answered garbage; deal untouched
    EngineUnavailable,
}

/// Compute the engine output option for `deal`
///
/// The file name is the last segment of the URL path, unless the raw query
/// starts with `filename=`: then the rest of the raw query is used as-is (no
/// query parsing, so `?filename=a.bin&x=1` yields `a.bin&x=1`). Only the final
/// path component of the chosen name is kept. The directory is
/// `<base>/<user_id>/<YYYYMM>` for the month of `now`.
///
/// Returns the failure note for the deal when no option can be derived.
pub fn download_option(
    base: &Path,
    deal: &Deal,
    now: &impl Datelike,
) -> std::result::Result<DownloadOption, String> {
    let url = Url::parse(&deal.source_url)
        .map_err(|e| format!("parse source file url error: {}", e))?;

    let name = match url.query().and_then(|q| q.strip_prefix("filename=")) {
        Some(raw) => final_component(raw),
        None => url
            .path()
            .rsplit('/')
            .next()
            .map(|segment| {
                urlencoding::decode(segment)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| segment.to_string())
            })
            .and_then(|segment| final_component(&segment)),
    }
    .ok_or_else(|| "source file url has no file name".to_string())?;

    let dir = base
        .join(deal.user_id.to_string())
        .join(format!("{}{:02}", now.year(), now.month()));

    Ok(DownloadOption { out: name, dir })
}

impl DealOrchestrator {
    /// Start a fresh engine download for `deal` and reconcile it once
    pub async fn start(&self, deal: &Deal) {
        self.start_deal(deal).await;
    }

    pub(crate) async fn start_deal(&self, deal: &Deal) -> StartOutcome {
        info!(deal_id = %deal.id, url = %deal.source_url, "Starting download");

        let option = match download_option(&self.download_dir, deal, &Local::now()) {
            Ok(option) => option,
            Err(note) => {
                error!(deal_id = %deal.id, "{}", note);
                self.apply(DealUpdate::failed(deal.id, note)).await;
                return StartOutcome::Rejected;
            }
        };

        let destination = option.destination();
        match remove_stale_file(&destination).await {
            Ok(true) => info!(deal_id = %deal.id, path = %destination.display(), "Removed stale file"),
            Ok(false) => {}
            Err(e) => warn!(
                deal_id = %deal.id,
                path = %destination.display(),
                error = %e,
                "Failed to remove stale file"
            ),
        }

        let handle = match self.engine.start_download(&deal.source_url, &option).await {
            Ok(handle) => handle,
            Err(Error::Rpc { code, message }) => {
                let note = format!("start download failed, code:{}, message:{}", code, message);
                error!(deal_id = %deal.id, "{}", note);
                self.apply(DealUpdate::failed(deal.id, note)).await;
                return StartOutcome::Rejected;
            }
            Err(e) => {
                error!(deal_id = %deal.id, error = %e, "Failed to create download task");
                return StartOutcome::EngineUnavailable;
            }
        };

        info!(deal_id = %deal.id, %handle, dir = %option.dir.display(), out = %option.out, "Download task created");

        self.reconcile(deal, &handle).await;
        StartOutcome::Started(handle)
    }
}
