//! Configuration types for offline-deal-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Provider identity this process acts for
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider identity used to scope every registry query (e.g. a miner address)
    #[serde(default)]
    pub provider_id: String,
}

/// Deal registry HTTP API settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the registry API (default: "http://127.0.0.1:8080")
    #[serde(default = "default_registry_url")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_registry_url(),
            api_token: None,
            timeout: default_request_timeout(),
        }
    }
}

/// Download engine (aria2 JSON-RPC) settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// JSON-RPC endpoint (default: "http://127.0.0.1:6800/jsonrpc")
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// RPC secret, sent as `token:<secret>`
    #[serde(default)]
    pub secret: Option<String>,

    /// Base output directory for downloads (default: "downloads")
    ///
    /// Files land in `<download_dir>/<user_id>/<YYYYMM>/`.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            secret: None,
            download_dir: default_download_dir(),
            timeout: default_request_timeout(),
        }
    }
}

/// Admission and polling behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum deals downloading at once (default: 10)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Delay between consecutive download starts within one tick (default: 1 second)
    #[serde(default = "default_start_pacing", with = "duration_serde")]
    pub start_pacing: Duration,

    /// Interval between polling ticks (default: 60 seconds)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: default_max_concurrent(),
            start_pacing: default_start_pacing(),
            poll_interval: default_poll_interval(),
        }
    }
}

/// Main configuration for the deal orchestrator
///
/// Grouped into sections that map one-to-one onto TOML tables:
///
/// ```toml
/// [provider]
/// provider_id = "f01234"
///
/// [registry]
/// base_url = "https://registry.example.com"
/// api_token = "secret"
///
/// [engine]
/// rpc_url = "http://127.0.0.1:6800/jsonrpc"
/// download_dir = "/srv/deals"
///
/// [orchestrator]
/// max_concurrent_downloads = 10
/// poll_interval = 60
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Provider identity
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Deal registry client settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Download engine client settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Admission and polling settings
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

impl Config {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config {
            message: format!("invalid TOML: {}", e),
            key: None,
        })
    }

    /// Read and parse a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read '{}': {}", path.display(), e),
            key: None,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check settings that have no usable default
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_id.trim().is_empty() {
            return Err(Error::config(
                "provider.provider_id",
                "provider_id must be set",
            ));
        }
        if self.orchestrator.max_concurrent_downloads == 0 {
            return Err(Error::config(
                "orchestrator.max_concurrent_downloads",
                "max_concurrent_downloads must be at least 1",
            ));
        }
        if self.orchestrator.poll_interval.is_zero() {
            return Err(Error::config(
                "orchestrator.poll_interval",
                "poll_interval must be at least 1 second",
            ));
        }
        url::Url::parse(&self.registry.base_url).map_err(|e| {
            Error::config("registry.base_url", format!("invalid URL: {}", e))
        })?;
        url::Url::parse(&self.engine.rpc_url)
            .map_err(|e| Error::config("engine.rpc_url", format!("invalid URL: {}", e)))?;
        Ok(())
    }
}

// Default value functions
fn default_registry_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:6800/jsonrpc".to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_concurrent() -> usize {
    10
}

fn default_start_pacing() -> Duration {
    Duration::from_secs(1)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(60)
}

// Duration serialization helper (as seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
