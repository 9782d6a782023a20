//! Download orchestrator.
//!
//! Composes the leaf services into the end-to-end offline flow:
//!
//! 1. Preconditions (non-empty selection, connectivity, known ids)
//! 2. Size estimate and space check, with at most one cleanup pass
//! 3. Durable-storage permission
//! 4. Sequential fetch with per-item failure isolation (see `batch`)
//!
//! Steps 1-3 have no side effects on the registry. A failure there aborts
//! the batch with an [`OfflineError`]; a failure in step 4 only marks that
//! item as failed in the [`BatchSummary`].
//!
//! # Concurrency Model
//!
//! One batch runs at a time per caller. `is_downloading` is advisory: the
//! orchestrator neither queues nor rejects a second batch.

mod batch;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use chapterkeep_core::domain::{CatalogEntry, ContentItem, ItemId, SpaceDecision, StorageInfo};
use chapterkeep_core::download::{BatchSummary, OfflineError, OfflineEvent, OfflineResult};
use chapterkeep_core::ports::{
    ConnectivityPort, ContentFetchPort, MetadataSourcePort, OfflineEventSink, RegistryStorePort,
    StorageAccountingPort,
};
use chapterkeep_core::services::{
    CleanupCoordinator, OfflineRegistry, PermissionNegotiator, SizeEstimator,
    SpaceAvailabilityChecker, StorageQuotaProbe,
};
use chapterkeep_core::settings::{
    MonitorSettings, OfflineSettings, OrchestratorSettings, SettingsError, validate_settings,
};
use chapterkeep_core::PermissionState;

use crate::monitor::QuotaMonitor;

/// Host collaborators required to build an orchestrator.
pub struct DownloadOrchestratorDeps {
    /// Lists the available items.
    pub catalog: Arc<dyn MetadataSourcePort>,
    /// Quota, durability and reclamation primitives.
    pub storage: Arc<dyn StorageAccountingPort>,
    /// Fetches, removes and validates payloads.
    pub fetcher: Arc<dyn ContentFetchPort>,
    /// Persists the registry and the permission record.
    pub store: Arc<dyn RegistryStorePort>,
    /// Reachability predicate.
    pub connectivity: Arc<dyn ConnectivityPort>,
    /// Receives progress and state-change events.
    pub events: Arc<dyn OfflineEventSink>,
}

/// Build an orchestrator from its collaborators.
///
/// Settings are validated first. The persisted registry is reconciled on
/// first use.
pub fn build_orchestrator(
    deps: DownloadOrchestratorDeps,
    settings: OfflineSettings,
) -> Result<DownloadOrchestrator, SettingsError> {
    validate_settings(&settings)?;

    let probe = StorageQuotaProbe::new(Arc::clone(&deps.storage));
    let checker = SpaceAvailabilityChecker::new(probe.clone());
    let cleanup = CleanupCoordinator::new(
        Arc::clone(&deps.storage),
        checker.clone(),
        settings.cleanup,
    );
    let permission = PermissionNegotiator::new(
        Arc::clone(&deps.storage),
        probe.clone(),
        Arc::clone(&deps.store),
    );
    let registry = Arc::new(OfflineRegistry::new(deps.store, Arc::clone(&deps.fetcher)));

    Ok(DownloadOrchestrator {
        catalog: deps.catalog,
        fetcher: deps.fetcher,
        connectivity: deps.connectivity,
        events: deps.events,
        estimator: SizeEstimator::new(settings.estimator),
        probe,
        checker,
        cleanup,
        permission,
        registry,
        settings: settings.orchestrator,
        monitor_settings: settings.monitor,
        downloading: AtomicBool::new(false),
    })
}

/// Drives offline batches and the maintenance operations around them.
pub struct DownloadOrchestrator {
    catalog: Arc<dyn MetadataSourcePort>,
    fetcher: Arc<dyn ContentFetchPort>,
    connectivity: Arc<dyn ConnectivityPort>,
    events: Arc<dyn OfflineEventSink>,
    estimator: SizeEstimator,
    probe: StorageQuotaProbe,
    checker: SpaceAvailabilityChecker,
    cleanup: CleanupCoordinator,
    permission: PermissionNegotiator,
    registry: Arc<OfflineRegistry>,
    settings: OrchestratorSettings,
    monitor_settings: MonitorSettings,
    downloading: AtomicBool,
}

/// Raises the busy flag for the lifetime of a batch.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl DownloadOrchestrator {
    /// Download `item_ids` for offline use.
    ///
    /// Returns `Err` only for batch-level failures detected before the
    /// first fetch. Per-item failures are reported in the summary.
    pub async fn download_all(&self, item_ids: &[ItemId]) -> OfflineResult<BatchSummary> {
        if item_ids.is_empty() {
            return Err(OfflineError::NoSelection);
        }
        if !self.connectivity.is_online() {
            return Err(OfflineError::Offline);
        }

        let _busy = BusyGuard::raise(&self.downloading);

        let items = self.resolve(item_ids).await?;
        let required_bytes = self.estimator.estimate_many(&items);
        debug!(
            target: "chapterkeep.download",
            items = items.len(),
            required_bytes,
            "pre-flight estimate"
        );

        self.ensure_space(required_bytes).await?;
        self.ensure_permission().await?;

        Ok(self.run_batch(items, required_bytes).await)
    }

    /// Whether a batch is currently running.
    pub fn is_downloading(&self) -> bool {
        self.downloading.load(Ordering::SeqCst)
    }

    /// Remove one item's payload, then unregister it.
    ///
    /// On removal failure the registry is left untouched.
    pub async fn delete_item(&self, id: ItemId) -> OfflineResult<()> {
        if let Err(e) = self.fetcher.remove(id).await {
            warn!(target: "chapterkeep.download", item_id = id, error = %e, "payload removal failed");
            return Err(OfflineError::removal_failed(id, e.to_string()));
        }
        self.registry.remove(id).await?;
        info!(target: "chapterkeep.download", item_id = id, "item removed");
        self.events.emit(OfflineEvent::ItemRemoved { item_id: id });
        Ok(())
    }

    /// Remove every registered item.
    ///
    /// Items whose payload removal succeeds are unregistered; the others
    /// stay registered. Every item is attempted and the first failure is
    /// returned after `RegistryCleared`.
    pub async fn clear_all(&self) -> OfflineResult<u32> {
        let mut removed = 0u32;
        let mut first_failure = None;

        for id in self.registry.downloaded_ids().await {
            match self.fetcher.remove(id).await {
                Ok(()) => match self.registry.remove(id).await {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        warn!(target: "chapterkeep.download", item_id = id, error = %e, "failed to unregister item");
                        first_failure.get_or_insert_with(|| OfflineError::from(e));
                    }
                },
                Err(e) => {
                    warn!(target: "chapterkeep.download", item_id = id, error = %e, "payload removal failed");
                    first_failure.get_or_insert_with(|| OfflineError::removal_failed(id, e.to_string()));
                }
            }
        }

        info!(target: "chapterkeep.download", removed, "offline storage cleared");
        self.events.emit(OfflineEvent::RegistryCleared { removed });
        first_failure.map_or(Ok(removed), Err)
    }

    /// The catalog annotated with estimates and offline state.
    pub async fn available_items(&self) -> Vec<CatalogEntry> {
        let mut entries = Vec::new();
        for item in self.list_catalog().await {
            let downloaded = self.registry.is_downloaded(item.id).await;
            entries.push(CatalogEntry {
                estimated_bytes: self.estimator.estimate_item(&item),
                item,
                downloaded,
            });
        }
        entries
    }

    /// Estimated footprint of `item_ids`.
    pub async fn estimate(&self, item_ids: &[ItemId]) -> OfflineResult<u64> {
        let items = self.resolve(item_ids).await?;
        Ok(self.estimator.estimate_many(&items))
    }

    /// Space decision for `item_ids` without cleaning up.
    pub async fn check_space(&self, item_ids: &[ItemId]) -> OfflineResult<SpaceDecision> {
        let required_bytes = self.estimate(item_ids).await?;
        Ok(self.checker.check(required_bytes).await)
    }

    /// Fresh storage summary.
    pub async fn storage_info(&self) -> StorageInfo {
        self.probe.storage_info().await
    }

    /// Current durable-storage state.
    pub async fn permission_status(&self) -> PermissionState {
        self.permission.status().await
    }

    /// Ask the host for durable storage.
    pub async fn request_persistence(&self) -> bool {
        let granted = self.permission.request_grant().await;
        self.events.emit(OfflineEvent::PermissionDecided { granted });
        granted
    }

    /// Re-validate the persisted registry against stored payloads.
    pub async fn reconcile(&self) -> Vec<ItemId> {
        self.registry.reconcile().await
    }

    /// Whether `id` is registered and still valid.
    pub async fn is_downloaded(&self, id: ItemId) -> bool {
        self.registry.is_downloaded(id).await
    }

    /// Registered ids, in registration order.
    pub async fn downloaded_ids(&self) -> Vec<ItemId> {
        self.registry.downloaded_ids().await
    }

    /// Shared handle to the registry.
    pub fn registry(&self) -> Arc<OfflineRegistry> {
        Arc::clone(&self.registry)
    }

    /// A quota monitor over the same storage, using the configured
    /// thresholds and poll interval.
    pub fn quota_monitor(&self, cancel_token: CancellationToken) -> QuotaMonitor {
        QuotaMonitor::new(self.probe.clone(), self.monitor_settings, cancel_token)
    }

    async fn list_catalog(&self) -> Vec<ContentItem> {
        match self.catalog.list_items().await {
            Ok(items) => items,
            Err(e) => {
                warn!(target: "chapterkeep.download", error = %e, "catalog unavailable");
                Vec::new()
            }
        }
    }

    /// Map ids to catalog items, first occurrence wins.
    async fn resolve(&self, item_ids: &[ItemId]) -> OfflineResult<Vec<ContentItem>> {
        let requested: IndexSet<ItemId> = item_ids.iter().copied().collect();
        let mut catalog: HashMap<ItemId, ContentItem> = self
            .list_catalog()
            .await
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        let mut items = Vec::with_capacity(requested.len());
        let mut unknown = Vec::new();
        for id in requested {
            match catalog.remove(&id) {
                Some(item) => items.push(item),
                None => unknown.push(id),
            }
        }

        if unknown.is_empty() {
            Ok(items)
        } else {
            Err(OfflineError::UnknownItems { ids: unknown })
        }
    }

    async fn ensure_space(&self, required_bytes: u64) -> OfflineResult<()> {
        let outcome = self.cleanup.can_proceed_with_cleanup(required_bytes).await;
        if outcome.needs_cleanup {
            self.events.emit(OfflineEvent::CleanupFinished {
                freed_bytes: outcome.freed_bytes,
            });
        }
        if outcome.can_download {
            return Ok(());
        }

        warn!(
            target: "chapterkeep.download",
            required_bytes,
            shortage_bytes = outcome.shortage_bytes,
            "insufficient space after cleanup"
        );
        Err(OfflineError::insufficient_space(outcome.shortage_bytes))
    }

    async fn ensure_permission(&self) -> OfflineResult<()> {
        if self.permission.status().await.granted {
            return Ok(());
        }
        if self.settings.request_persistence_automatically && self.request_persistence().await {
            return Ok(());
        }
        info!(target: "chapterkeep.download", "durable storage not granted");
        Err(OfflineError::PermissionRequired)
    }
}
