//! Status mapper: turns an engine status response into one deal decision.

use crate::engine::status::{StatusResponse, TaskState, parse_status_response};
use crate::error::Result;
use crate::types::{Deal, DealId, DealStatus, DealUpdate, TaskHandle};
use crate::utils::FileProbe;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Note written when the engine reports anything but exactly one file
pub const WRONG_FILE_AMOUNT: &str = "wrong file amount";

/// File location and size attached to a decision
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    /// Path on disk
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

/// Outcome of mapping one status response onto a deal
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Mark the deal failed
    Fail {
        /// Failure note
        note: String,
        /// Engine-reported file, when known
        file: Option<FileInfo>,
    },
    /// Bind the task to the deal and mark it downloading
    MarkDownloading {
        /// Engine task handle
        handle: TaskHandle,
        /// Path and on-disk size so far
        file: FileInfo,
    },
    /// Mark the deal downloaded
    MarkDownloaded {
        /// Engine task handle
        handle: TaskHandle,
        /// Path and on-disk size
        file: FileInfo,
    },
    /// Engine says complete but the file is absent
    FailMissingFile {
        /// Failure note ("... not found ...")
        note: String,
        /// Expected path and engine-reported size
        file: FileInfo,
    },
    /// Nothing to write
    NoOp,
}

impl Decision {
    /// Registry write for this decision, if any
    pub fn into_update(self, deal_id: DealId) -> Option<DealUpdate> {
        let update = match self {
            Decision::Fail { note, file } => {
                let update = DealUpdate::failed(deal_id, note);
                match file {
                    Some(file) => update.with_file(file.path, file.size),
                    None => update,
                }
            }
            Decision::MarkDownloading { handle, file } => {
                DealUpdate::with_task(deal_id, DealStatus::Downloading, handle)
                    .with_file(file.path, file.size)
            }
            Decision::MarkDownloaded { handle, file } => {
                DealUpdate::with_task(deal_id, DealStatus::Downloaded, handle)
                    .with_file(file.path, file.size)
            }
            Decision::FailMissingFile { note, file } => {
                DealUpdate::failed(deal_id, note).with_file(file.path, file.size)
            }
            Decision::NoOp => return None,
        };
        Some(update)
    }
}

/// Completion percentage, floored; 0 when `total` is 0
pub fn completion_percent(completed: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    ((completed as u128 * 100) / total as u128) as u64
}

/// Engine speed in KiB/s (bytes/sec divided by 1000)
pub fn speed_kib(bytes_per_sec: u64) -> u64 {
    bytes_per_sec / 1000
}

/// Map a raw `tellStatus` response for `handle` onto `deal`
///
/// Returns [`crate::Error::Protocol`] when the body matches neither envelope;
/// the caller must then leave the deal untouched.
pub fn map_status(
    raw: &str,
    deal: &Deal,
    handle: &TaskHandle,
    probe: &dyn FileProbe,
) -> Result<Decision> {
    let status = match parse_status_response(raw)? {
        StatusResponse::Task(status) => status,
        StatusResponse::Failure(failure) => {
            let note = format!(
                "get status for {}, code:{}, message:{}",
                handle, failure.code, failure.message
            );
            error!(deal_id = %deal.id, %handle, "{}", note);
            return Ok(Decision::Fail { note, file: None });
        }
    };

    let [file] = status.files.as_slice() else {
        error!(
            deal_id = %deal.id,
            %handle,
            files = status.files.len(),
            "{}",
            WRONG_FILE_AMOUNT
        );
        return Ok(Decision::Fail {
            note: WRONG_FILE_AMOUNT.to_string(),
            file: None,
        });
    };

    let path = PathBuf::from(&file.path);
    let total = file.length_bytes();
    let percent = completion_percent(file.completed_bytes(), total);
    let speed = speed_kib(status.download_speed_bps());

    let decision = match status.status {
        TaskState::Error => {
            let note = format!(
                "deal status for {}, code:{}, message:{}, status:{}",
                handle, status.error_code, status.error_message, status.status
            );
            error!(deal_id = %deal.id, "{}", note);
            Decision::Fail { note, file: None }
        }
        TaskState::Active => {
            let on_disk = on_disk_size(probe, &path).unwrap_or(0);
            info!(
                deal_id = %deal.id,
                file_size = total,
                complete_percent = percent,
                speed_kib = speed,
                "Deal downloading"
            );
            if deal.status == DealStatus::Downloading {
                Decision::NoOp
            } else {
                Decision::MarkDownloading {
                    handle: handle.clone(),
                    file: FileInfo {
                        path,
                        size: on_disk,
                    },
                }
            }
        }
        TaskState::Complete => match on_disk_size(probe, &path) {
            Some(size) => {
                info!(deal_id = %deal.id, path = %path.display(), size, "Deal downloaded");
                Decision::MarkDownloaded {
                    handle: handle.clone(),
                    file: FileInfo { path, size },
                }
            }
            None => {
                let note = format!("file {} not found on disk", path.display());
                error!(deal_id = %deal.id, "{}", note);
                Decision::FailMissingFile {
                    note,
                    file: FileInfo { path, size: total },
                }
            }
        },
        TaskState::Waiting | TaskState::Paused | TaskState::Removed | TaskState::Unknown => {
            let note = format!("download failed, cause: {}", status.error_message);
            error!(deal_id = %deal.id, state = %status.status, "{}", note);
            if note == deal.note_str() {
                Decision::NoOp
            } else {
                Decision::Fail {
                    note,
                    file: Some(FileInfo { path, size: total }),
                }
            }
        }
    };

    Ok(decision)
}

fn on_disk_size(probe: &dyn FileProbe, path: &Path) -> Option<u64> {
    if path.as_os_str().is_empty() {
        return None;
    }
    probe.file_size(path)
}
