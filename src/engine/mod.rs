//! Download engine collaborator
//!
//! The orchestrator talks to the engine through [`DownloadEngine`], so the
//! aria2 JSON-RPC client can be swapped for a fake in tests.

pub mod aria2;
pub mod status;

pub use aria2::Aria2Client;
pub use status::{
    RpcErrorObject, StatusResponse, TaskFile, TaskState, TaskStatus, parse_status_response,
};

use crate::error::Result;
use crate::types::TaskHandle;
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;

/// Output placement for a new download task
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DownloadOption {
    /// File name inside `dir`
    pub out: String,
    /// Destination directory
    pub dir: PathBuf,
}

impl DownloadOption {
    /// Full destination path (`dir/out`)
    pub fn destination(&self) -> PathBuf {
        self.dir.join(&self.out)
    }
}

/// Abstraction over the download daemon
#[async_trait]
pub trait DownloadEngine: Send + Sync {
    /// Create a download task for `url` and return its handle
    async fn start_download(&self, url: &str, option: &DownloadOption) -> Result<TaskHandle>;

    /// Query a task's status, returning the raw response body
    ///
    /// The body is handed to [`parse_status_response`] unmodified, so both
    /// the success and failure envelopes must be passed through.
    async fn task_status(&self, handle: &TaskHandle) -> Result<String>;
}
