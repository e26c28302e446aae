//! Common test utilities for offline-deal-dl end-to-end tests
//!
//! Both collaborators are `wiremock` servers: one speaks the deal registry's
//! JSON API, the other aria2's JSON-RPC.

#![allow(dead_code)]

use chrono::{Datelike, Local};
use offline_deal_dl::Config;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Provider every test deal belongs to
pub const PROVIDER: &str = "f01234";

/// User owning every test deal
pub const USER_ID: i64 = 42;

/// Registry and engine fakes for one test
pub struct Harness {
    pub registry: MockServer,
    pub aria2: MockServer,
    pub download_dir: tempfile::TempDir,
}

impl Harness {
    pub async fn start() -> Self {
        Self {
            registry: MockServer::start().await,
            aria2: MockServer::start().await,
            download_dir: tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}")),
        }
    }

    /// Config pointing at both fakes
    pub fn config(&self, limit: usize) -> Config {
        let mut config = Config::default();
        config.provider.provider_id = PROVIDER.to_string();
        config.registry.base_url = self.registry.uri();
        config.registry.api_token = Some("test-token".to_string());
        config.registry.timeout = Duration::from_secs(5);
        config.engine.rpc_url = format!("{}/jsonrpc", self.aria2.uri());
        config.engine.download_dir = self.download_dir.path().to_path_buf();
        config.engine.timeout = Duration::from_secs(5);
        config.orchestrator.max_concurrent_downloads = limit;
        config.orchestrator.start_pacing = Duration::from_millis(10);
        config
    }

    /// Directory a start this month writes into
    pub fn month_dir(&self) -> PathBuf {
        month_dir(self.download_dir.path())
    }

    /// Serve `deals` for every `status` listing
    pub async fn list_always(&self, status: &str, deals: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/offline_deals/{PROVIDER}")))
            .and(query_param("deal_status", status))
            .respond_with(deal_list(deals))
            .mount(&self.registry)
            .await;
    }

    /// Serve `deals` for the next `status` listing only
    ///
    /// Mount these before the fallback from [`list_always`](Self::list_always).
    pub async fn list_once(&self, status: &str, deals: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/offline_deals/{PROVIDER}")))
            .and(query_param("deal_status", status))
            .respond_with(deal_list(deals))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&self.registry)
            .await;
    }

    /// Accept every deal update
    pub async fn accept_updates(&self) {
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .mount(&self.registry)
            .await;
    }

    /// Answer `aria2.addUri` with `gid`
    pub async fn add_uri_returns(&self, gid: &str) {
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_partial_json(json!({"method": "aria2.addUri"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "1", "jsonrpc": "2.0", "result": gid
            })))
            .mount(&self.aria2)
            .await;
    }

    /// Answer `aria2.tellStatus` for `gid` with a single-file task
    pub async fn tell_status(&self, gid: &str, state: &str, completed: u64, length: u64, file: &Path) {
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_partial_json(json!({
                "method": "aria2.tellStatus",
                "params": [gid]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "1",
                "jsonrpc": "2.0",
                "result": {
                    "gid": gid,
                    "status": state,
                    "errorCode": "0",
                    "errorMessage": "",
                    "downloadSpeed": "1024000",
                    "files": [{
                        "index": "1",
                        "completedLength": completed.to_string(),
                        "length": length.to_string(),
                        "path": file.to_string_lossy(),
                        "selected": "true"
                    }]
                }
            })))
            .mount(&self.aria2)
            .await;
    }

    /// Every update body the registry received, in order
    pub async fn update_bodies(&self) -> Vec<(String, Value)> {
        requests_with_method(&self.registry, "PUT")
            .await
            .into_iter()
            .map(|request| {
                let body = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
                (request.url.path().to_string(), body)
            })
            .collect()
    }

    /// Every JSON-RPC call to `rpc_method` the engine received, in order
    pub async fn rpc_calls(&self, rpc_method: &str) -> Vec<Value> {
        requests_with_method(&self.aria2, "POST")
            .await
            .into_iter()
            .filter_map(|request| serde_json::from_slice::<Value>(&request.body).ok())
            .filter(|body| body["method"] == rpc_method)
            .collect()
    }
}

async fn requests_with_method(server: &MockServer, http_method: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.method.as_str() == http_method)
        .collect()
}

/// Registry listing envelope
pub fn deal_list(deals: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": "success",
        "data": {"deal": deals}
    }))
}

/// Registry record for a deal
pub fn deal_record(id: i64, status: &str, url: &str, note: &str) -> Value {
    json!({
        "id": id,
        "user_id": USER_ID,
        "miner_fid": PROVIDER,
        "source_file_url": url,
        "status": status,
        "note": note,
        "file_path": "",
        "file_size": "0"
    })
}

/// `<base>/<user_id>/<YYYYMM>` for the current month
pub fn month_dir(base: &Path) -> PathBuf {
    let now = Local::now();
    base.join(USER_ID.to_string())
        .join(format!("{}{:02}", now.year(), now.month()))
}
