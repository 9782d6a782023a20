//! In-memory port implementations for tests.
//!
//! Enabled for this crate's unit tests and, through the `test-utils`
//! feature, for downstream integration tests.

#![allow(clippy::unwrap_used, clippy::missing_const_for_fn)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::{ContentItem, ItemId, PermissionRecord};
use crate::download::OfflineEvent;
use crate::ports::{
    ConnectivityPort, ContentFetchPort, MetadataSourcePort, OfflineEventSink, PortError,
    RegistryStorePort, RepositoryError, StorageAccountingPort,
};

/// One mebibyte, for readable quota fixtures.
pub const MB: u64 = 1024 * 1024;

/// Host storage with a quota, cache buckets and key-value entries.
///
/// Deleting a bucket or key lowers `used` by the size it was created with.
#[derive(Default)]
pub struct InMemoryStorage {
    unsupported: AtomicBool,
    quota: Mutex<u64>,
    used: Mutex<u64>,
    persisted: AtomicBool,
    grant_on_request: AtomicBool,
    fail_quota: AtomicBool,
    fail_persisted: AtomicBool,
    fail_enumeration: AtomicBool,
    buckets: Mutex<BTreeMap<String, u64>>,
    keys: Mutex<BTreeMap<String, u64>>,
    undeletable: Mutex<HashSet<String>>,
    persist_requests: AtomicU32,
    bucket_listings: AtomicU32,
}

impl InMemoryStorage {
    /// Storage with the given quota and usage.
    #[must_use]
    pub fn new(quota: u64, used: u64) -> Self {
        let storage = Self::default();
        *storage.quota.lock().unwrap() = quota;
        *storage.used.lock().unwrap() = used;
        storage
    }

    /// Host without a storage-accounting capability.
    #[must_use]
    pub fn unsupported() -> Self {
        let storage = Self::default();
        storage.unsupported.store(true, Ordering::SeqCst);
        storage
    }

    #[must_use]
    pub fn persisted(self, persisted: bool) -> Self {
        self.persisted.store(persisted, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn granting(self, grant: bool) -> Self {
        self.grant_on_request.store(grant, Ordering::SeqCst);
        self
    }

    /// Add a cache bucket occupying `size` bytes of usage.
    #[must_use]
    pub fn with_bucket(self, name: &str, size: u64) -> Self {
        self.buckets.lock().unwrap().insert(name.to_string(), size);
        self
    }

    /// Add a key-value entry occupying `size` bytes of usage.
    #[must_use]
    pub fn with_key(self, key: &str, size: u64) -> Self {
        self.keys.lock().unwrap().insert(key.to_string(), size);
        self
    }

    /// Make deletion of the named bucket or key fail.
    #[must_use]
    pub fn undeletable(self, name: &str) -> Self {
        self.undeletable.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn set_fail_quota(&self, fail: bool) {
        self.fail_quota.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_persisted(&self, fail: bool) {
        self.fail_persisted.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_enumeration(&self, fail: bool) {
        self.fail_enumeration.store(fail, Ordering::SeqCst);
    }

    pub fn set_used(&self, used: u64) {
        *self.used.lock().unwrap() = used;
    }

    pub fn used(&self) -> u64 {
        *self.used.lock().unwrap()
    }

    pub fn bucket_names(&self) -> Vec<String> {
        self.buckets.lock().unwrap().keys().cloned().collect()
    }

    pub fn key_names(&self) -> Vec<String> {
        self.keys.lock().unwrap().keys().cloned().collect()
    }

    /// Number of `request_persist` calls received.
    pub fn persist_requests(&self) -> u32 {
        self.persist_requests.load(Ordering::SeqCst)
    }

    /// Number of bucket enumerations (one per cleanup pass).
    pub fn bucket_listings(&self) -> u32 {
        self.bucket_listings.load(Ordering::SeqCst)
    }

    fn release(&self, size: u64) {
        let mut used = self.used.lock().unwrap();
        *used = used.saturating_sub(size);
    }
}

#[async_trait]
impl StorageAccountingPort for InMemoryStorage {
    fn is_supported(&self) -> bool {
        !self.unsupported.load(Ordering::SeqCst)
    }

    async fn quota_and_usage(&self) -> Result<(u64, u64), PortError> {
        if self.fail_quota.load(Ordering::SeqCst) {
            return Err(PortError::Rejected("estimate unavailable".to_string()));
        }
        Ok((*self.quota.lock().unwrap(), *self.used.lock().unwrap()))
    }

    async fn is_persisted(&self) -> Result<bool, PortError> {
        if self.fail_persisted.load(Ordering::SeqCst) {
            return Err(PortError::Unsupported);
        }
        Ok(self.persisted.load(Ordering::SeqCst))
    }

    async fn request_persist(&self) -> Result<bool, PortError> {
        self.persist_requests.fetch_add(1, Ordering::SeqCst);
        let granted = self.grant_on_request.load(Ordering::SeqCst);
        if granted {
            self.persisted.store(true, Ordering::SeqCst);
        }
        Ok(granted)
    }

    async fn cache_buckets(&self) -> Result<Vec<String>, PortError> {
        self.bucket_listings.fetch_add(1, Ordering::SeqCst);
        if self.fail_enumeration.load(Ordering::SeqCst) {
            return Err(PortError::Rejected("enumeration denied".to_string()));
        }
        Ok(self.bucket_names())
    }

    async fn delete_cache_bucket(&self, name: &str) -> Result<(), PortError> {
        if self.undeletable.lock().unwrap().contains(name) {
            return Err(PortError::Rejected(format!("bucket {name} is locked")));
        }
        let size = self
            .buckets
            .lock()
            .unwrap()
            .remove(name)
            .ok_or_else(|| PortError::NotFound(name.to_string()))?;
        self.release(size);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, PortError> {
        if self.fail_enumeration.load(Ordering::SeqCst) {
            return Err(PortError::Rejected("enumeration denied".to_string()));
        }
        Ok(self.key_names())
    }

    async fn delete_key(&self, key: &str) -> Result<(), PortError> {
        if self.undeletable.lock().unwrap().contains(key) {
            return Err(PortError::Rejected(format!("key {key} is locked")));
        }
        let size = self
            .keys
            .lock()
            .unwrap()
            .remove(key)
            .ok_or_else(|| PortError::NotFound(key.to_string()))?;
        self.release(size);
        Ok(())
    }
}

/// Registry store backed by a vector.
#[derive(Default)]
pub struct InMemoryRegistryStore {
    ids: Mutex<Vec<ItemId>>,
    permission: Mutex<Option<PermissionRecord>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    saves: AtomicU32,
}

impl InMemoryRegistryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with an id list.
    #[must_use]
    pub fn with_ids(ids: &[ItemId]) -> Self {
        let store = Self::default();
        *store.ids.lock().unwrap() = ids.to_vec();
        store
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.ids.lock().unwrap().clone()
    }

    pub fn permission(&self) -> Option<PermissionRecord> {
        *self.permission.lock().unwrap()
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `save_ids` calls.
    pub fn saves(&self) -> u32 {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryStorePort for InMemoryRegistryStore {
    async fn load_ids(&self) -> Result<Vec<ItemId>, RepositoryError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(RepositoryError::Storage("read failed".to_string()));
        }
        Ok(self.ids())
    }

    async fn save_ids(&self, ids: &[ItemId]) -> Result<(), RepositoryError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RepositoryError::Storage("write failed".to_string()));
        }
        *self.ids.lock().unwrap() = ids.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_permission(&self) -> Result<Option<PermissionRecord>, RepositoryError> {
        Ok(self.permission())
    }

    async fn save_permission(&self, record: &PermissionRecord) -> Result<(), RepositoryError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RepositoryError::Storage("write failed".to_string()));
        }
        *self.permission.lock().unwrap() = Some(*record);
        Ok(())
    }
}

/// Fetch capability storing payload presence in a set.
#[derive(Default)]
pub struct FakeFetcher {
    stored: Mutex<HashSet<ItemId>>,
    corrupted: Mutex<HashSet<ItemId>>,
    failing: Mutex<HashSet<ItemId>>,
    failing_removals: Mutex<HashSet<ItemId>>,
    progress_steps: Mutex<Vec<u8>>,
    fetched: Mutex<Vec<ItemId>>,
    gate: Option<Arc<Notify>>,
}

impl FakeFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            progress_steps: Mutex::new(vec![25, 50, 75, 100]),
            ..Self::default()
        }
    }

    /// Pretend the given payloads are already stored.
    #[must_use]
    pub fn with_stored(self, ids: &[ItemId]) -> Self {
        self.stored.lock().unwrap().extend(ids);
        self
    }

    /// Fetches of these ids fail.
    #[must_use]
    pub fn failing(self, ids: &[ItemId]) -> Self {
        self.failing.lock().unwrap().extend(ids);
        self
    }

    /// Removal of these ids fails.
    #[must_use]
    pub fn failing_removal(self, ids: &[ItemId]) -> Self {
        self.failing_removals.lock().unwrap().extend(ids);
        self
    }

    /// Progress percentages reported by each fetch.
    #[must_use]
    pub fn with_progress_steps(self, steps: &[u8]) -> Self {
        *self.progress_steps.lock().unwrap() = steps.to_vec();
        self
    }

    /// Every fetch waits for [`Self::release_fetch`] before storing.
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Let one gated fetch complete.
    pub fn release_fetch(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    /// Make a stored payload fail validation (out-of-band corruption).
    pub fn corrupt(&self, id: ItemId) {
        self.corrupted.lock().unwrap().insert(id);
    }

    /// Drop a stored payload (out-of-band eviction).
    pub fn evict(&self, id: ItemId) {
        self.stored.lock().unwrap().remove(&id);
    }

    pub fn is_stored(&self, id: ItemId) -> bool {
        self.stored.lock().unwrap().contains(&id)
    }

    /// Ids passed to `fetch_and_store`, in call order.
    pub fn fetched(&self) -> Vec<ItemId> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentFetchPort for FakeFetcher {
    async fn fetch_and_store(
        &self,
        id: ItemId,
        on_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<(), PortError> {
        self.fetched.lock().unwrap().push(id);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.failing.lock().unwrap().contains(&id) {
            on_progress(10);
            return Err(PortError::Network(format!("chapter {id} unreachable")));
        }
        let steps = self.progress_steps.lock().unwrap().clone();
        for step in steps {
            on_progress(step);
        }
        self.stored.lock().unwrap().insert(id);
        self.corrupted.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn remove(&self, id: ItemId) -> Result<(), PortError> {
        if self.failing_removals.lock().unwrap().contains(&id) {
            return Err(PortError::Rejected(format!("chapter {id} is locked")));
        }
        self.stored.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn validate(&self, id: ItemId) -> bool {
        self.stored.lock().unwrap().contains(&id) && !self.corrupted.lock().unwrap().contains(&id)
    }
}

/// Metadata source with a fixed catalog.
#[derive(Default)]
pub struct StaticCatalog {
    items: Vec<ContentItem>,
    unavailable: AtomicBool,
}

impl StaticCatalog {
    #[must_use]
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self {
            items,
            unavailable: AtomicBool::new(false),
        }
    }

    /// `count` items with ids `1..=count`, each with `unit_count` units.
    #[must_use]
    pub fn uniform(count: u32, unit_count: u32) -> Self {
        Self::new(
            (1..=count)
                .map(|id| ContentItem::new(id, format!("Chapter {id}"), unit_count))
                .collect(),
        )
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetadataSourcePort for StaticCatalog {
    async fn list_items(&self) -> Result<Vec<ContentItem>, PortError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PortError::Network("catalog unreachable".to_string()));
        }
        Ok(self.items.clone())
    }
}

/// Connectivity that can be toggled.
#[derive(Debug)]
pub struct ToggleConnectivity(AtomicBool);

impl ToggleConnectivity {
    #[must_use]
    pub fn new(online: bool) -> Self {
        Self(AtomicBool::new(online))
    }

    pub fn set_online(&self, online: bool) {
        self.0.store(online, Ordering::SeqCst);
    }
}

impl ConnectivityPort for ToggleConnectivity {
    fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sink that records every event.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<OfflineEvent>>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OfflineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl OfflineEventSink for RecordingSink {
    fn emit(&self, event: OfflineEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn clone_box(&self) -> Box<dyn OfflineEventSink> {
        Box::new(self.clone())
    }
}
