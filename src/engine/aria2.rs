//! aria2 JSON-RPC client

use super::{DownloadEngine, DownloadOption, RpcErrorObject};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::types::TaskHandle;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};

/// [`DownloadEngine`] backed by an aria2 daemon's HTTP JSON-RPC endpoint
pub struct Aria2Client {
    http: reqwest::Client,
    rpc_url: String,
    secret: Option<String>,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct AddUriResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

impl Aria2Client {
    /// Build a client from the engine configuration
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            rpc_url: config.rpc_url.clone(),
            secret: config.secret.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Prepend the `token:<secret>` parameter when a secret is configured
    fn params(&self, rest: Vec<Value>) -> Vec<Value> {
        match &self.secret {
            Some(secret) => std::iter::once(Value::String(format!("token:{}", secret)))
                .chain(rest)
                .collect(),
            None => rest,
        }
    }

    /// Issue one JSON-RPC call and return the response body
    ///
    /// aria2 reports JSON-RPC errors with a non-2xx HTTP status, so the body
    /// is returned whatever the status code.
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<String> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id.to_string(),
            "method": method,
            "params": self.params(params),
        });

        let response = self.http.post(&self.rpc_url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(method, %status, body_len = body.len(), "aria2 RPC response");
        Ok(body)
    }
}

#[async_trait]
impl DownloadEngine for Aria2Client {
    async fn start_download(&self, url: &str, option: &DownloadOption) -> Result<TaskHandle> {
        let body = self
            .call(
                "aria2.addUri",
                vec![json!([url]), serde_json::to_value(option)?],
            )
            .await?;

        let response: AddUriResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Protocol(format!("malformed addUri response: {}", e)))?;

        match (response.result, response.error) {
            (Some(gid), _) if !gid.is_empty() => Ok(TaskHandle::new(gid)),
            (_, Some(error)) => Err(Error::Rpc {
                code: error.code,
                message: error.message,
            }),
            _ => Err(Error::Protocol(
                "addUri response carries no task handle".to_string(),
            )),
        }
    }

    async fn task_status(&self, handle: &TaskHandle) -> Result<String> {
        self.call("aria2.tellStatus", vec![json!(handle.as_str())])
            .await
    }
}
