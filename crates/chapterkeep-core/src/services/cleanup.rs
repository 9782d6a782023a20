//! Best-effort storage reclamation.
//!
//! Two surfaces are scanned: cache buckets whose names look stale, and
//! key-value entries whose keys look temporary. Each deletion is credited
//! with a fixed byte estimate from [`CleanupSettings`]; the host offers no
//! per-entry size accounting, so `freed_bytes` is an approximation that only
//! gates the single re-check in [`CleanupCoordinator::can_proceed_with_cleanup`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::SpaceAvailabilityChecker;
use crate::domain::{CleanupOutcome, CleanupResult};
use crate::ports::StorageAccountingPort;
use crate::settings::CleanupSettings;

/// Runs bounded reclamation passes.
#[derive(Clone)]
pub struct CleanupCoordinator {
    storage: Arc<dyn StorageAccountingPort>,
    checker: SpaceAvailabilityChecker,
    settings: CleanupSettings,
}

fn matches_any(name: &str, patterns: &[String]) -> bool {
    let name = name.to_lowercase();
    patterns
        .iter()
        .any(|pattern| name.contains(&pattern.to_lowercase()))
}

impl CleanupCoordinator {
    /// Create a coordinator.
    pub fn new(
        storage: Arc<dyn StorageAccountingPort>,
        checker: SpaceAvailabilityChecker,
        settings: CleanupSettings,
    ) -> Self {
        Self {
            storage,
            checker,
            settings,
        }
    }

    /// Run one reclamation pass. Never fails.
    pub async fn cleanup(&self) -> CleanupResult {
        let mut result = CleanupResult::default();
        if !self.storage.is_supported() {
            debug!(target: "chapterkeep.cleanup", "storage accounting unsupported, nothing to reclaim");
            return result;
        }

        match self.storage.cache_buckets().await {
            Ok(buckets) => {
                for bucket in buckets
                    .iter()
                    .filter(|b| matches_any(b, &self.settings.stale_bucket_patterns))
                {
                    match self.storage.delete_cache_bucket(bucket).await {
                        Ok(()) => {
                            result.buckets_deleted += 1;
                            result.freed_bytes = result
                                .freed_bytes
                                .saturating_add(self.settings.bucket_estimate_bytes);
                        }
                        Err(e) => {
                            warn!(target: "chapterkeep.cleanup", bucket = %bucket, error = %e, "bucket deletion failed");
                        }
                    }
                }
            }
            Err(e) => warn!(target: "chapterkeep.cleanup", error = %e, "bucket enumeration failed"),
        }

        match self.storage.keys().await {
            Ok(keys) => {
                for key in keys
                    .iter()
                    .filter(|k| matches_any(k, &self.settings.temporary_key_patterns))
                {
                    match self.storage.delete_key(key).await {
                        Ok(()) => {
                            result.keys_deleted += 1;
                            result.freed_bytes = result
                                .freed_bytes
                                .saturating_add(self.settings.key_estimate_bytes);
                        }
                        Err(e) => {
                            warn!(target: "chapterkeep.cleanup", key = %key, error = %e, "key deletion failed");
                        }
                    }
                }
            }
            Err(e) => warn!(target: "chapterkeep.cleanup", error = %e, "key enumeration failed"),
        }

        info!(
            target: "chapterkeep.cleanup",
            freed_bytes = result.freed_bytes,
            buckets_deleted = result.buckets_deleted,
            keys_deleted = result.keys_deleted,
            "cleanup finished"
        );
        result
    }

    /// Decide whether `required_bytes` fit, cleaning up at most once.
    ///
    /// When the first check passes no cleanup runs. Otherwise one pass runs,
    /// followed by exactly one re-check.
    pub async fn can_proceed_with_cleanup(&self, required_bytes: u64) -> CleanupOutcome {
        let (initial, snapshot) = self.checker.check_with_snapshot(required_bytes).await;
        if initial.has_enough_space {
            return CleanupOutcome {
                can_download: true,
                needs_cleanup: false,
                available_after_cleanup: snapshot.reported_available(),
                freed_bytes: 0,
                shortage_bytes: 0,
            };
        }

        let freed = self.cleanup().await;
        let (after, snapshot) = self.checker.check_with_snapshot(required_bytes).await;
        debug!(
            target: "chapterkeep.cleanup",
            required_bytes,
            freed_bytes = freed.freed_bytes,
            shortage_bytes = after.shortage_bytes,
            "re-checked after cleanup"
        );
        CleanupOutcome {
            can_download: after.has_enough_space,
            needs_cleanup: true,
            available_after_cleanup: snapshot.reported_available(),
            freed_bytes: freed.freed_bytes,
            shortage_bytes: after.shortage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StorageQuotaProbe;
    use crate::testing::{InMemoryStorage, MB};

    fn coordinator(storage: &Arc<InMemoryStorage>) -> CleanupCoordinator {
        let port: Arc<dyn StorageAccountingPort> = storage.clone();
        let checker = SpaceAvailabilityChecker::new(StorageQuotaProbe::new(Arc::clone(&port)));
        CleanupCoordinator::new(port, checker, CleanupSettings::default())
    }

    #[tokio::test]
    async fn test_deletes_only_matching_entries() {
        let storage = Arc::new(
            InMemoryStorage::new(10 * MB, 5 * MB)
                .with_bucket("chapters-v2", MB)
                .with_bucket("chapters-old", MB)
                .with_bucket("TEMP-assets", MB)
                .with_key("reading-position", 10)
                .with_key("search_cache", 10)
                .with_key("tempDraft", 10),
        );
        let result = coordinator(&storage).cleanup().await;

        assert_eq!(result.buckets_deleted, 2);
        assert_eq!(result.keys_deleted, 2);
        assert_eq!(result.freed_bytes, 2 * MB + 2 * 1024);
        assert_eq!(storage.bucket_names(), vec!["chapters-v2"]);
        assert_eq!(storage.key_names(), vec!["reading-position"]);
    }

    #[tokio::test]
    async fn test_nothing_to_reclaim_is_zero() {
        let storage = Arc::new(InMemoryStorage::new(10 * MB, 0).with_bucket("chapters", MB));
        assert_eq!(coordinator(&storage).cleanup().await, CleanupResult::default());
    }

    #[tokio::test]
    async fn test_failed_deletion_is_skipped() {
        let storage = Arc::new(
            InMemoryStorage::new(10 * MB, 0)
                .with_bucket("old-a", MB)
                .with_bucket("old-b", MB)
                .undeletable("old-a"),
        );
        let result = coordinator(&storage).cleanup().await;
        assert_eq!(result.buckets_deleted, 1);
        assert_eq!(storage.bucket_names(), vec!["old-a"]);
    }

    #[tokio::test]
    async fn test_enumeration_failure_is_swallowed() {
        let storage = Arc::new(InMemoryStorage::new(10 * MB, 0).with_bucket("old", MB));
        storage.set_fail_enumeration(true);
        assert_eq!(coordinator(&storage).cleanup().await.freed_bytes, 0);
    }

    #[tokio::test]
    async fn test_unsupported_host_reclaims_nothing() {
        let storage = Arc::new(InMemoryStorage::unsupported());
        assert_eq!(coordinator(&storage).cleanup().await.freed_bytes, 0);
        assert_eq!(storage.bucket_listings(), 0);
    }

    #[tokio::test]
    async fn test_no_cleanup_when_space_suffices() {
        let storage = Arc::new(InMemoryStorage::new(10 * MB, 0).with_bucket("old", MB));
        let outcome = coordinator(&storage).can_proceed_with_cleanup(10 * MB).await;

        assert!(outcome.can_download);
        assert!(!outcome.needs_cleanup);
        assert_eq!(outcome.available_after_cleanup, 10 * MB);
        assert_eq!(storage.bucket_listings(), 0);
        assert_eq!(storage.bucket_names(), vec!["old"]);
    }

    #[tokio::test]
    async fn test_cleanup_then_single_recheck() {
        // 10MB quota, 8MB used, 3MB reclaimable, 4MB requested
        let storage = Arc::new(
            InMemoryStorage::new(10 * MB, 8 * MB)
                .with_bucket("temp-downloads", 3 * MB),
        );
        let outcome = coordinator(&storage).can_proceed_with_cleanup(4 * MB).await;

        assert!(outcome.can_download);
        assert!(outcome.needs_cleanup);
        assert_eq!(outcome.available_after_cleanup, 5 * MB);
        assert_eq!(storage.bucket_listings(), 1);
    }

    #[tokio::test]
    async fn test_under_freeing_pass_is_not_retried() {
        let storage = Arc::new(
            InMemoryStorage::new(10 * MB, 9 * MB).with_bucket("old", MB / 2),
        );
        let outcome = coordinator(&storage).can_proceed_with_cleanup(4 * MB).await;

        assert!(!outcome.can_download);
        assert!(outcome.needs_cleanup);
        assert_eq!(outcome.freed_bytes, MB);
        assert_eq!(outcome.shortage_bytes, 4 * MB - (MB + MB / 2));
        assert_eq!(storage.bucket_listings(), 1);
    }
}
