//! Offline registry - the record of which items are retained.
//!
//! The persisted list is never trusted as-is: payloads can be evicted or
//! corrupted out-of-band, so [`OfflineRegistry::reconcile`] re-validates
//! every entry and [`OfflineRegistry::is_downloaded`] re-validates on each
//! query. The first read or mutation reconciles once if nobody has yet,
//! so a fresh registry never overwrites what an earlier run persisted.
//!
//! # Consistency
//!
//! Mutations write the persisted form first and commit the in-memory set
//! only after the write succeeded, under the same write lock. A failed
//! write therefore leaves both forms at the previous state.

use std::sync::Arc;

use indexmap::IndexSet;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, warn};

use crate::domain::ItemId;
use crate::ports::{ContentFetchPort, RegistryStorePort, RepositoryError};

/// Authoritative record of retained, valid items.
pub struct OfflineRegistry {
    store: Arc<dyn RegistryStorePort>,
    fetcher: Arc<dyn ContentFetchPort>,
    /// Registered ids in insertion order.
    ids: RwLock<IndexSet<ItemId>>,
    /// Set once the persisted list has been reconciled into `ids`.
    loaded: OnceCell<()>,
}

impl OfflineRegistry {
    /// Create a registry over `store`. Nothing is read until first use.
    pub fn new(store: Arc<dyn RegistryStorePort>, fetcher: Arc<dyn ContentFetchPort>) -> Self {
        Self {
            store,
            fetcher,
            ids: RwLock::new(IndexSet::new()),
            loaded: OnceCell::new(),
        }
    }

    async fn ensure_loaded(&self) {
        self.loaded
            .get_or_init(|| async {
                self.reconcile_persisted().await;
            })
            .await;
    }

    /// Load the persisted list and drop every id whose payload no longer
    /// validates. The persisted list is rewritten only when it changed.
    ///
    /// Idempotent as long as storage does not change in between.
    pub async fn reconcile(&self) -> Vec<ItemId> {
        let verified = self.reconcile_persisted().await;
        // Already set when a lazy load won the race; either way memory is current
        let _ = self.loaded.set(());
        verified
    }

    async fn reconcile_persisted(&self) -> Vec<ItemId> {
        let persisted = match self.store.load_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(target: "chapterkeep.registry", error = %e, "failed to load registry");
                Vec::new()
            }
        };

        let mut verified = IndexSet::with_capacity(persisted.len());
        for id in &persisted {
            if self.fetcher.validate(*id).await {
                verified.insert(*id);
            } else {
                info!(target: "chapterkeep.registry", item_id = id, "pruning invalid entry");
            }
        }

        let verified_ids: Vec<ItemId> = verified.iter().copied().collect();
        let mut ids = self.ids.write().await;
        if verified_ids != persisted {
            if let Err(e) = self.store.save_ids(&verified_ids).await {
                // Memory still reflects only verified entries; the next
                // reconcile retries the rewrite.
                warn!(target: "chapterkeep.registry", error = %e, "failed to rewrite reconciled registry");
            }
        }
        debug!(
            target: "chapterkeep.registry",
            loaded = persisted.len(),
            verified = verified_ids.len(),
            "registry reconciled"
        );
        *ids = verified;
        verified_ids
    }

    /// Register an item. Adding an already registered id is a no-op.
    pub async fn add(&self, id: ItemId) -> Result<(), RepositoryError> {
        self.ensure_loaded().await;
        let mut ids = self.ids.write().await;
        if ids.contains(&id) {
            return Ok(());
        }
        let mut next = ids.clone();
        next.insert(id);
        self.commit(&mut ids, next).await
    }

    /// Unregister an item. Removing an unknown id is a no-op.
    pub async fn remove(&self, id: ItemId) -> Result<(), RepositoryError> {
        self.ensure_loaded().await;
        let mut ids = self.ids.write().await;
        if !ids.contains(&id) {
            return Ok(());
        }
        let mut next = ids.clone();
        next.shift_remove(&id);
        self.commit(&mut ids, next).await
    }

    /// Unregister everything.
    pub async fn clear_all(&self) -> Result<(), RepositoryError> {
        self.ensure_loaded().await;
        let mut ids = self.ids.write().await;
        self.commit(&mut ids, IndexSet::new()).await
    }

    /// Whether `id` is registered and its payload still validates.
    pub async fn is_downloaded(&self, id: ItemId) -> bool {
        self.ensure_loaded().await;
        if !self.ids.read().await.contains(&id) {
            return false;
        }
        self.fetcher.validate(id).await
    }

    /// Registered ids, in insertion order, without re-validation.
    pub async fn downloaded_ids(&self) -> Vec<ItemId> {
        self.ensure_loaded().await;
        self.ids.read().await.iter().copied().collect()
    }

    /// Rewrite the persisted list from memory.
    pub async fn persist(&self) -> Result<(), RepositoryError> {
        self.ensure_loaded().await;
        let ids = self.ids.read().await;
        let list: Vec<ItemId> = ids.iter().copied().collect();
        self.store.save_ids(&list).await
    }

    async fn commit(
        &self,
        current: &mut IndexSet<ItemId>,
        next: IndexSet<ItemId>,
    ) -> Result<(), RepositoryError> {
        let list: Vec<ItemId> = next.iter().copied().collect();
        self.store.save_ids(&list).await?;
        *current = next;
        Ok(())
    }
}
