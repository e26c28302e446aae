//! Deal registry collaborator
//!
//! The registry is the single source of truth for deal state. This crate only
//! reads deals and issues one status write at a time through [`DealRegistry`].

pub mod http;

pub use http::RegistryClient;

use crate::error::Result;
use crate::types::{Deal, DealStatus, DealUpdate};
use async_trait::async_trait;

/// Abstraction over the deal registry API
#[async_trait]
pub trait DealRegistry: Send + Sync {
    /// List deals of `provider_id` in any of `statuses`
    ///
    /// Results for each status are returned in the registry's own order,
    /// statuses in the order given. `limit` caps the total count.
    async fn list_deals(
        &self,
        provider_id: &str,
        statuses: &[DealStatus],
        limit: Option<usize>,
    ) -> Result<Vec<Deal>>;

    /// Write a new status (and optional note, task handle, file info) for one deal
    async fn update_deal_status(&self, update: &DealUpdate) -> Result<()>;
}
