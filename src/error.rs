//! Error types for offline-deal-dl
//!
//! Collaborator calls (deal registry, download engine, filesystem) return
//! [`Result`]. The orchestrator's public entry points never surface these to
//! their caller; they end in a log line or a deal status write instead.

use thiserror::Error;

/// Result type alias for offline-deal-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for offline-deal-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "provider.provider_id")
        key: Option<String>,
    },

    /// Network error talking to the registry or the engine
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Deal registry rejected a request
    #[error("deal registry error (status {status}): {message}")]
    Registry {
        /// HTTP status code returned by the registry (0 when the envelope reported failure)
        status: u16,
        /// Body or message returned by the registry
        message: String,
    },

    /// Download engine returned a JSON-RPC error object
    #[error("download engine error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// JSON-RPC error message
        message: String,
    },

    /// Download engine response did not match any known envelope
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}
