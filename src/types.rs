//! Core types for offline deals and download tasks

use std::fmt;
use std::path::PathBuf;

/// Unique identifier for an offline deal in the deal registry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DealId(pub i64);

impl DealId {
    /// Create a new DealId from an i64
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for DealId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Opaque identifier of one download engine task (aria2 "gid")
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(String);

impl TaskHandle {
    /// Wrap a handle returned by the download engine
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Borrow the handle as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of an offline deal
///
/// Deals enter the system as `Created` or `Waiting`, move to `Downloading`
/// once an engine task exists, and end in `Downloaded` or `DownloadFailed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DealStatus {
    /// Freshly created, not yet picked up
    Created,
    /// Waiting for a download slot
    Waiting,
    /// An engine task is transferring the file
    Downloading,
    /// File is fully present on disk
    Downloaded,
    /// Download failed; not retried automatically
    DownloadFailed,
}

impl DealStatus {
    /// Registry wire name of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            DealStatus::Created => "Created",
            DealStatus::Waiting => "Waiting",
            DealStatus::Downloading => "Downloading",
            DealStatus::Downloaded => "Downloaded",
            DealStatus::DownloadFailed => "DownloadFailed",
        }
    }

    /// Parse a registry wire name, returning `None` for unknown values
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Created" => Some(DealStatus::Created),
            "Waiting" => Some(DealStatus::Waiting),
            "Downloading" => Some(DealStatus::Downloading),
            "Downloaded" => Some(DealStatus::Downloaded),
            "DownloadFailed" => Some(DealStatus::DownloadFailed),
            _ => None,
        }
    }

    /// Whether the deal can be handed to the download starter
    pub fn is_eligible_for_start(&self) -> bool {
        matches!(self, DealStatus::Created | DealStatus::Waiting)
    }
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file-fetch obligation owned by a provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deal {
    /// Registry identifier
    pub id: DealId,
    /// Owning user, used to group downloads on disk
    pub user_id: i64,
    /// Owning provider identity
    pub provider_id: String,
    /// Remote URL of the file to fetch
    pub source_url: String,
    /// Current lifecycle status
    pub status: DealStatus,
    /// Human-readable note (failure reason)
    pub note: Option<String>,
    /// Engine task bound to this deal while it is downloading
    pub task_handle: Option<TaskHandle>,
    /// Local file path once known
    pub file_path: Option<PathBuf>,
    /// Local file size in bytes once known
    pub file_size: Option<u64>,
}

impl Deal {
    /// Current note, or the empty string when none is set
    pub fn note_str(&self) -> &str {
        self.note.as_deref().unwrap_or_default()
    }
}

/// A single status write issued to the deal registry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DealUpdate {
    /// Deal to update
    pub deal_id: DealId,
    /// New status
    pub status: DealStatus,
    /// Human-readable note
    pub note: Option<String>,
    /// Engine task handle bound to the deal
    pub task_handle: Option<TaskHandle>,
    /// Local file path
    pub file_path: Option<PathBuf>,
    /// Local file size in bytes
    pub file_size: Option<u64>,
}

impl DealUpdate {
    /// Mark a deal failed with only a note
    pub fn failed(deal_id: DealId, note: impl Into<String>) -> Self {
        Self {
            deal_id,
            status: DealStatus::DownloadFailed,
            note: Some(note.into()),
            task_handle: None,
            file_path: None,
            file_size: None,
        }
    }

    /// Attach the file path and size
    pub fn with_file(mut self, path: impl Into<PathBuf>, size: u64) -> Self {
        self.file_path = Some(path.into());
        self.file_size = Some(size);
        self
    }

    /// Bind a task to the deal under the given status
    pub fn with_task(deal_id: DealId, status: DealStatus, handle: TaskHandle) -> Self {
        Self {
            deal_id,
            status,
            note: None,
            task_handle: Some(handle),
            file_path: None,
            file_size: None,
        }
    }
}
