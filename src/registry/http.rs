//! HTTP client for the deal registry API
//!
//! The registry stores an active deal's task handle in its `note` column.
//! This client hides that overlap: a `Downloading` record's note becomes
//! [`Deal::task_handle`], and a [`DealUpdate`] carrying a handle is written
//! with the handle as its note.

use super::DealRegistry;
use crate::config::RegistryConfig;
use crate::error::{Error, Result};
use crate::types::{Deal, DealId, DealStatus, DealUpdate, TaskHandle};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// [`DealRegistry`] implementation over the registry's JSON API
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

/// Deal record as returned by the registry
#[derive(Debug, Deserialize)]
struct DealRecord {
    id: i64,
    #[serde(default)]
    user_id: i64,
    #[serde(default)]
    miner_fid: Option<String>,
    #[serde(default)]
    source_file_url: String,
    status: String,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default, deserialize_with = "lenient_size")]
    file_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
struct DealList {
    #[serde(default)]
    deal: Vec<DealRecord>,
}

#[derive(Debug, Serialize)]
struct UpdateBody<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_size: Option<String>,
}

/// Accept a size as either a JSON number or a decimal string
fn lenient_size<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Size>::deserialize(deserializer)? {
        Some(Size::Number(n)) => Some(n),
        Some(Size::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl DealRecord {
    /// Convert to a [`Deal`], rejecting unknown status strings
    fn into_deal(self, provider_id: &str) -> Option<Deal> {
        let Some(status) = DealStatus::parse(&self.status) else {
            tracing::warn!(
                deal_id = self.id,
                status = %self.status,
                "Skipping deal with unknown status"
            );
            return None;
        };

        let note = non_empty(self.note);
        let (note, task_handle) = match status {
            DealStatus::Downloading => (None, note.map(TaskHandle::new)),
            _ => (note, None),
        };

        Some(Deal {
            id: DealId(self.id),
            user_id: self.user_id,
            provider_id: non_empty(self.miner_fid).unwrap_or_else(|| provider_id.to_string()),
            source_url: self.source_file_url,
            status,
            note,
            task_handle,
            file_path: non_empty(self.file_path).map(PathBuf::from),
            file_size: self.file_size,
        })
    }
}

impl RegistryClient {
    /// Build a client from the registry configuration
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and return its body, mapping non-2xx to [`Error::Registry`]
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Registry {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(body)
    }

    async fn list_by_status(
        &self,
        provider_id: &str,
        status: DealStatus,
        limit: Option<usize>,
    ) -> Result<Vec<Deal>> {
        let url = format!("{}/offline_deals/{}", self.base_url, provider_id);
        let mut query = vec![("deal_status", status.as_str().to_string())];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        query.push(("offset", "0".to_string()));

        let body = self.send(self.http.get(&url).query(&query)).await?;
        let envelope: Envelope<DealList> = serde_json::from_str(&body)?;
        if envelope.status != "success" {
            return Err(Error::Registry {
                status: 0,
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("list returned status '{}'", envelope.status)),
            });
        }

        Ok(envelope
            .data
            .unwrap_or_default()
            .deal
            .into_iter()
            .filter_map(|record| record.into_deal(provider_id))
            .collect())
    }
}

#[async_trait]
impl DealRegistry for RegistryClient {
    async fn list_deals(
        &self,
        provider_id: &str,
        statuses: &[DealStatus],
        limit: Option<usize>,
    ) -> Result<Vec<Deal>> {
        let mut deals = Vec::new();
        for status in statuses {
            let remaining = limit.map(|l| l.saturating_sub(deals.len()));
            if remaining == Some(0) {
                break;
            }
            deals.extend(self.list_by_status(provider_id, *status, remaining).await?);
        }
        if let Some(limit) = limit {
            deals.truncate(limit);
        }
        Ok(deals)
    }

    async fn update_deal_status(&self, update: &DealUpdate) -> Result<()> {
        let url = format!("{}/my_miner/deals/{}", self.base_url, update.deal_id);
        let note = update
            .task_handle
            .as_ref()
            .map(TaskHandle::as_str)
            .or(update.note.as_deref());
        let body = UpdateBody {
            status: update.status.as_str(),
            note,
            file_path: update
                .file_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            file_size: update.file_size.map(|s| s.to_string()),
        };

        let response = self.send(self.http.put(&url).json(&body)).await?;

        // Some deployments answer with an empty body; only a parsed envelope can veto.
        if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(&response)
            && !envelope.status.is_empty()
            && envelope.status != "success"
        {
            return Err(Error::Registry {
                status: 0,
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("update returned status '{}'", envelope.status)),
            });
        }

        tracing::debug!(
            deal_id = %update.deal_id,
            status = %update.status,
            "Deal status updated"
        );
        Ok(())
    }
}
