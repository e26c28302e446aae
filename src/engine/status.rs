//! Wire shapes of the engine's task status query
//!
//! `aria2.tellStatus` answers with one of two JSON-RPC envelopes:
//!
//! ```json
//! {"id":"1","jsonrpc":"2.0","result":{"status":"active","files":[...], ...}}
//! {"id":"1","jsonrpc":"2.0","error":{"code":1,"message":"GID 2089b05ecca3d829 is not found"}}
//! ```
//!
//! Numeric fields arrive as decimal strings.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;

/// State of an engine task, as reported by `aria2.tellStatus`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Currently transferring
    Active,
    /// Queued inside the engine
    Waiting,
    /// Paused inside the engine
    Paused,
    /// Stopped because of an error
    Error,
    /// Finished
    Complete,
    /// Removed by a user or another client
    Removed,
    /// Any state string this crate does not know
    #[serde(other)]
    Unknown,
}

impl TaskState {
    /// Engine's own name for this state
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Active => "active",
            TaskState::Waiting => "waiting",
            TaskState::Paused => "paused",
            TaskState::Error => "error",
            TaskState::Complete => "complete",
            TaskState::Removed => "removed",
            TaskState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file entry of a task
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFile {
    /// Bytes received so far, as reported by the engine
    #[serde(default)]
    pub completed_length: String,
    /// Expected total size
    #[serde(default)]
    pub length: String,
    /// Resolved path on disk
    #[serde(default)]
    pub path: String,
}

impl TaskFile {
    /// Completed length in bytes (0 when unparseable)
    pub fn completed_bytes(&self) -> u64 {
        parse_count(&self.completed_length)
    }

    /// Expected length in bytes (0 when unparseable)
    pub fn length_bytes(&self) -> u64 {
        parse_count(&self.length)
    }
}

/// The `result` object of a successful status query
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    /// Task state
    pub status: TaskState,
    /// Engine error code (only meaningful for stopped tasks)
    #[serde(default)]
    pub error_code: String,
    /// Engine error message (only meaningful for stopped tasks)
    #[serde(default)]
    pub error_message: String,
    /// Download speed in bytes/sec
    #[serde(default)]
    pub download_speed: String,
    /// Files of the task
    #[serde(default)]
    pub files: Vec<TaskFile>,
}

impl TaskStatus {
    /// Download speed in bytes/sec (0 when unparseable)
    pub fn download_speed_bps(&self) -> u64 {
        parse_count(&self.download_speed)
    }
}

/// JSON-RPC error object
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RpcErrorObject {
    /// Error code
    pub code: i64,
    /// Error message
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize)]
struct SuccessEnvelope {
    #[serde(default)]
    result: Option<TaskStatus>,
}

#[derive(Deserialize)]
struct FailureEnvelope {
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// A parsed status response
#[derive(Clone, Debug)]
pub enum StatusResponse {
    /// Success envelope with a result
    Task(TaskStatus),
    /// Failure envelope with an error object
    Failure(RpcErrorObject),
}

/// Parse a raw `aria2.tellStatus` response body
///
/// The success envelope is tried first. When it does not parse or carries no
/// result, the failure envelope is tried. A body matching neither is an
/// [`Error::Protocol`].
pub fn parse_status_response(raw: &str) -> Result<StatusResponse> {
    let success_err = match serde_json::from_str::<SuccessEnvelope>(raw) {
        Ok(SuccessEnvelope {
            result: Some(status),
        }) => return Ok(StatusResponse::Task(status)),
        Ok(SuccessEnvelope { result: None }) => None,
        Err(e) => Some(e),
    };

    match serde_json::from_str::<FailureEnvelope>(raw) {
        Ok(FailureEnvelope { error: Some(error) }) => Ok(StatusResponse::Failure(error)),
        Ok(FailureEnvelope { error: None }) => Err(Error::Protocol(match success_err {
            Some(e) => format!("unrecognized status response: {}", e),
            None => "status response has neither result nor error".to_string(),
        })),
        Err(e) => Err(Error::Protocol(format!("malformed status response: {}", e))),
    }
}

fn parse_count(value: &str) -> u64 {
    value.trim().parse().unwrap_or(0)
}
