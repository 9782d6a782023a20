//! Registry store port definition.
//!
//! This port persists the "what is offline" list and the last durable
//! storage decision so both survive process restarts.
//!
//! # Design
//!
//! - The id list is replaced as a whole; implementations must make the
//!   replacement atomic (readers see the old or the new list, never a mix)
//! - Validity is not persisted: it is recomputed by reconciliation

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{ItemId, PermissionRecord};

/// Port for persisting the offline registry.
///
/// Implemented by `chapterkeep-db`.
#[async_trait]
pub trait RegistryStorePort: Send + Sync {
    /// Load the ordered list of registered ids (empty if never saved).
    async fn load_ids(&self) -> Result<Vec<ItemId>, RepositoryError>;

    /// Replace the registered id list.
    async fn save_ids(&self, ids: &[ItemId]) -> Result<(), RepositoryError>;

    /// Load the last durable-storage decision, if any.
    async fn load_permission(&self) -> Result<Option<PermissionRecord>, RepositoryError>;

    /// Record a durable-storage decision.
    async fn save_permission(&self, record: &PermissionRecord) -> Result<(), RepositoryError>;
}
