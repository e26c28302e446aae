//! In-memory collaborators for orchestrator tests.

use crate::config::Config;
use crate::engine::{DownloadEngine, DownloadOption};
use crate::error::{Error, Result};
use crate::registry::DealRegistry;
use crate::types::{Deal, DealId, DealStatus, DealUpdate, TaskHandle};
use crate::utils::FileProbe;
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::DealOrchestrator;

pub(crate) const PROVIDER: &str = "f01234";

/// Registry that keeps deals in memory and applies updates in place
#[derive(Default)]
pub(crate) struct FakeRegistry {
    pub(crate) deals: Mutex<Vec<Deal>>,
    pub(crate) updates: Mutex<Vec<DealUpdate>>,
    pub(crate) fail_lists: AtomicBool,
    pub(crate) fail_updates: AtomicBool,
    pub(crate) list_calls: AtomicUsize,
}

impl FakeRegistry {
    pub(crate) fn with_deals(deals: Vec<Deal>) -> Arc<Self> {
        Arc::new(Self {
            deals: Mutex::new(deals),
            ..Self::default()
        })
    }

    pub(crate) fn updates(&self) -> Vec<DealUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub(crate) fn deal(&self, id: i64) -> Deal {
        self.deals
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == DealId(id))
            .cloned()
            .unwrap()
    }
}

#[async_trait]
impl DealRegistry for FakeRegistry {
    async fn list_deals(
        &self,
        provider_id: &str,
        statuses: &[DealStatus],
        limit: Option<usize>,
    ) -> Result<Vec<Deal>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(Error::Registry {
                status: 503,
                message: "registry down".into(),
            });
        }

        let deals = self.deals.lock().unwrap();
        let mut found: Vec<Deal> = statuses
            .iter()
            .flat_map(|status| {
                deals
                    .iter()
                    .filter(move |d| d.provider_id == provider_id && d.status == *status)
                    .cloned()
            })
            .collect();
        if let Some(limit) = limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    async fn update_deal_status(&self, update: &DealUpdate) -> Result<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Error::Registry {
                status: 500,
                message: "write failed".into(),
            });
        }
        self.updates.lock().unwrap().push(update.clone());

        let mut deals = self.deals.lock().unwrap();
        if let Some(deal) = deals.iter_mut().find(|d| d.id == update.deal_id) {
            deal.status = update.status;
            deal.note = update.note.clone();
            deal.task_handle = update.task_handle.clone();
            if update.file_path.is_some() {
                deal.file_path = update.file_path.clone();
            }
            if update.file_size.is_some() {
                deal.file_size = update.file_size;
            }
        }
        Ok(())
    }
}

/// Engine that hands out scripted handles and serves canned status bodies
#[derive(Default)]
pub(crate) struct FakeEngine {
    /// Raw `tellStatus` bodies keyed by handle
    pub(crate) statuses: Mutex<HashMap<String, String>>,
    /// Scripted `addUri` results; when empty, `gid-<n>` handles are generated
    pub(crate) start_results: Mutex<VecDeque<Result<TaskHandle>>>,
    /// Every `addUri` request received
    pub(crate) started: Mutex<Vec<(String, DownloadOption)>>,
    /// Every `tellStatus` request received
    pub(crate) status_queries: Mutex<Vec<TaskHandle>>,
    /// Body served for handles without a canned status
    pub(crate) default_status: Mutex<Option<String>>,
}

impl FakeEngine {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn set_status(&self, handle: &str, raw: impl Into<String>) {
        self.statuses
            .lock()
            .unwrap()
            .insert(handle.to_string(), raw.into());
    }

    pub(crate) fn set_default_status(&self, raw: impl Into<String>) {
        *self.default_status.lock().unwrap() = Some(raw.into());
    }

    pub(crate) fn push_start_result(&self, result: Result<TaskHandle>) {
        self.start_results.lock().unwrap().push_back(result);
    }

    pub(crate) fn started(&self) -> Vec<(String, DownloadOption)> {
        self.started.lock().unwrap().clone()
    }

    pub(crate) fn status_queries(&self) -> usize {
        self.status_queries.lock().unwrap().len()
    }
}

#[async_trait]
impl DownloadEngine for FakeEngine {
    async fn start_download(&self, url: &str, option: &DownloadOption) -> Result<TaskHandle> {
        let count = {
            let mut started = self.started.lock().unwrap();
            started.push((url.to_string(), option.clone()));
            started.len()
        };
        match self.start_results.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(TaskHandle::new(format!("gid-{count}"))),
        }
    }

    async fn task_status(&self, handle: &TaskHandle) -> Result<String> {
        self.status_queries.lock().unwrap().push(handle.clone());
        if let Some(raw) = self.statuses.lock().unwrap().get(handle.as_str()) {
            return Ok(raw.clone());
        }
        self.default_status
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::Other(format!("no status scripted for {handle}")))
    }
}

/// File probe answering from a fixed map
#[derive(Default)]
pub(crate) struct MemoryProbe(pub(crate) HashMap<PathBuf, u64>);

impl MemoryProbe {
    pub(crate) fn with(files: &[(&str, u64)]) -> Self {
        Self(
            files
                .iter()
                .map(|(path, size)| (PathBuf::from(path), *size))
                .collect(),
        )
    }
}

impl FileProbe for MemoryProbe {
    fn file_size(&self, path: &Path) -> Option<u64> {
        self.0.get(path).copied()
    }
}

pub(crate) fn deal(id: i64, status: DealStatus, url: &str) -> Deal {
    Deal {
        id: DealId(id),
        user_id: 42,
        provider_id: PROVIDER.to_string(),
        source_url: url.to_string(),
        status,
        note: None,
        task_handle: None,
        file_path: None,
        file_size: None,
    }
}

pub(crate) fn downloading_deal(id: i64, handle: &str) -> Deal {
    Deal {
        task_handle: Some(TaskHandle::new(handle)),
        ..deal(id, DealStatus::Downloading, "http://h/f.bin")
    }
}

pub(crate) fn test_config(download_dir: &Path, limit: usize) -> Config {
    let mut config = Config::default();
    config.provider.provider_id = PROVIDER.to_string();
    config.engine.download_dir = download_dir.to_path_buf();
    config.orchestrator.max_concurrent_downloads = limit;
    config.orchestrator.start_pacing = Duration::from_millis(10);
    config
}

pub(crate) fn orchestrator(
    config: &Config,
    registry: Arc<FakeRegistry>,
    engine: Arc<FakeEngine>,
    probe: MemoryProbe,
) -> DealOrchestrator {
    DealOrchestrator::new(config, registry, engine).with_file_probe(Arc::new(probe))
}

/// Success envelope for a single-file task
pub(crate) fn status_body(
    state: &str,
    completed: u64,
    length: u64,
    path: &str,
    error_message: &str,
) -> String {
    json!({
        "id": "1",
        "jsonrpc": "2.0",
        "result": {
            "gid": "gid",
            "status": state,
            "errorCode": if error_message.is_empty() { "0" } else { "1" },
            "errorMessage": error_message,
            "downloadSpeed": "2048000",
            "totalLength": length.to_string(),
            "completedLength": completed.to_string(),
            "files": [{
                "index": "1",
                "completedLength": completed.to_string(),
                "length": length.to_string(),
                "path": path,
                "selected": "true",
                "uris": []
            }]
        }
    })
    .to_string()
}

/// Success envelope with an arbitrary number of file entries
pub(crate) fn status_body_with_files(state: &str, files: usize) -> String {
    let files: Vec<_> = (0..files)
        .map(|i| {
            json!({
                "completedLength": "10",
                "length": "10",
                "path": format!("/d/part{i}.bin")
            })
        })
        .collect();
    json!({"result": {"status": state, "files": files}}).to_string()
}
