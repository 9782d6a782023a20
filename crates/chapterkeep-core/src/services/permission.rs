//! Durable-storage permission negotiation.

use std::sync::Arc;

use tracing::{info, warn};

use super::StorageQuotaProbe;
use crate::domain::{PermissionRecord, PermissionState};
use crate::ports::{RegistryStorePort, StorageAccountingPort};

/// Requests and tracks the durable-storage grant.
///
/// A denied grant is a valid terminal state, not an error: retained data
/// may then be evicted under storage pressure.
#[derive(Clone)]
pub struct PermissionNegotiator {
    storage: Arc<dyn StorageAccountingPort>,
    probe: StorageQuotaProbe,
    store: Arc<dyn RegistryStorePort>,
}

impl PermissionNegotiator {
    /// Create a negotiator.
    pub fn new(
        storage: Arc<dyn StorageAccountingPort>,
        probe: StorageQuotaProbe,
        store: Arc<dyn RegistryStorePort>,
    ) -> Self {
        Self {
            storage,
            probe,
            store,
        }
    }

    /// Live grant status plus the recorded decision time.
    pub async fn status(&self) -> PermissionState {
        let granted = self.probe.is_persistent().await;
        let decided_at = match self.store.load_permission().await {
            Ok(record) => record.map(|r| r.decided_at),
            Err(e) => {
                warn!(target: "chapterkeep.permission", error = %e, "failed to load permission record");
                None
            }
        };
        PermissionState {
            granted,
            decided_at,
        }
    }

    /// Ask the host for durable storage.
    ///
    /// Short-circuits to `true` without prompting when storage is already
    /// persistent. Otherwise issues exactly one request and records the
    /// outcome and time whatever it is. Host errors count as a denial.
    pub async fn request_grant(&self) -> bool {
        if self.probe.is_persistent().await {
            return true;
        }
        if !self.storage.is_supported() {
            info!(target: "chapterkeep.permission", "storage accounting unsupported, grant impossible");
            return false;
        }

        let granted = match self.storage.request_persist().await {
            Ok(granted) => granted,
            Err(e) => {
                warn!(target: "chapterkeep.permission", error = %e, "persist request failed");
                false
            }
        };

        if let Err(e) = self.store.save_permission(&PermissionRecord::now(granted)).await {
            warn!(target: "chapterkeep.permission", error = %e, "failed to record permission decision");
        }
        info!(target: "chapterkeep.permission", granted, "durable storage decided");
        granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryRegistryStore, InMemoryStorage, MB};

    fn negotiator(
        storage: &Arc<InMemoryStorage>,
        store: &Arc<InMemoryRegistryStore>,
    ) -> PermissionNegotiator {
        let port: Arc<dyn StorageAccountingPort> = storage.clone();
        PermissionNegotiator::new(
            Arc::clone(&port),
            StorageQuotaProbe::new(port),
            store.clone(),
        )
    }

    #[tokio::test]
    async fn test_already_persistent_short_circuits() {
        let storage = Arc::new(InMemoryStorage::new(10 * MB, 0).persisted(true));
        let store = Arc::new(InMemoryRegistryStore::new());
        let negotiator = negotiator(&storage, &store);

        assert!(negotiator.request_grant().await);
        assert!(negotiator.request_grant().await);
        assert_eq!(storage.persist_requests(), 0);
        assert!(store.permission().is_none());
    }

    #[tokio::test]
    async fn test_grant_is_recorded() {
        let storage = Arc::new(InMemoryStorage::new(10 * MB, 0).granting(true));
        let store = Arc::new(InMemoryRegistryStore::new());
        let negotiator = negotiator(&storage, &store);

        assert!(!negotiator.status().await.granted);
        assert!(negotiator.request_grant().await);

        let state = negotiator.status().await;
        assert!(state.granted);
        assert!(state.decided_at.is_some());
        assert_eq!(storage.persist_requests(), 1);
    }

    #[tokio::test]
    async fn test_denial_is_recorded_not_an_error() {
        let storage = Arc::new(InMemoryStorage::new(10 * MB, 0).granting(false));
        let store = Arc::new(InMemoryRegistryStore::new());
        let negotiator = negotiator(&storage, &store);

        assert!(!negotiator.request_grant().await);
        let record = store.permission().unwrap();
        assert!(!record.granted);

        let state = negotiator.status().await;
        assert!(!state.granted);
        assert_eq!(state.decided_at, Some(record.decided_at));
    }

    #[tokio::test]
    async fn test_unsupported_host_denies_without_request() {
        let storage = Arc::new(InMemoryStorage::unsupported());
        let store = Arc::new(InMemoryRegistryStore::new());
        assert!(!negotiator(&storage, &store).request_grant().await);
        assert_eq!(storage.persist_requests(), 0);
    }
}
