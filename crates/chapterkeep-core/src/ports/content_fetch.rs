//! Fetch-and-persist port.
//!
//! The transport that actually downloads chapter content lives outside the
//! core. Implementations own timeouts, retries and the storage format of
//! the payload.

use async_trait::async_trait;

use super::PortError;
use crate::domain::ItemId;

/// Port for fetching, storing, removing and validating item payloads.
#[async_trait]
pub trait ContentFetchPort: Send + Sync {
    /// Fetch an item and persist it locally.
    ///
    /// `on_progress` receives a percentage (0-100) and may be called any
    /// number of times as data arrives. It may borrow from the caller.
    async fn fetch_and_store(
        &self,
        id: ItemId,
        on_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<(), PortError>;

    /// Remove a stored payload.
    async fn remove(&self, id: ItemId) -> Result<(), PortError>;

    /// Whether the stored payload is present and structurally valid.
    async fn validate(&self, id: ItemId) -> bool;
}
