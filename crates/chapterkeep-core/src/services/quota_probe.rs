//! Storage quota probing.
//!
//! Reads quota, usage and the durable-storage flag from the host. Host
//! failures never escape this component: an unsupported or failing host
//! is reported as a zeroed snapshot, which every caller treats as
//! "cannot proceed".

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{QuotaSnapshot, StorageInfo};
use crate::ports::StorageAccountingPort;

/// Reads [`QuotaSnapshot`]s from the storage-accounting capability.
#[derive(Clone)]
pub struct StorageQuotaProbe {
    storage: Arc<dyn StorageAccountingPort>,
}

impl StorageQuotaProbe {
    /// Create a probe over a storage-accounting port.
    pub fn new(storage: Arc<dyn StorageAccountingPort>) -> Self {
        Self { storage }
    }

    /// Whether the host exposes storage accounting.
    pub fn is_supported(&self) -> bool {
        self.storage.is_supported()
    }

    /// Take a fresh snapshot.
    ///
    /// The quota/usage estimate and the persisted flag are queried
    /// independently; a failure of the flag alone yields real figures with
    /// `is_persistent = false`.
    pub async fn probe(&self) -> QuotaSnapshot {
        if !self.storage.is_supported() {
            debug!(target: "chapterkeep.quota", "storage accounting unsupported");
            return QuotaSnapshot::zeroed();
        }

        let (quota, used) = match self.storage.quota_and_usage().await {
            Ok(figures) => figures,
            Err(e) => {
                warn!(target: "chapterkeep.quota", error = %e, "quota estimate failed");
                return QuotaSnapshot::zeroed();
            }
        };

        let snapshot = QuotaSnapshot::new(quota, used, self.is_persistent().await);
        debug!(
            target: "chapterkeep.quota",
            quota_bytes = snapshot.quota_bytes,
            used_bytes = snapshot.used_bytes,
            available_bytes = snapshot.available_bytes,
            is_persistent = snapshot.is_persistent,
            "quota probed"
        );
        snapshot
    }

    /// Whether durable storage is currently granted (`false` on any failure).
    pub async fn is_persistent(&self) -> bool {
        if !self.storage.is_supported() {
            return false;
        }
        match self.storage.is_persisted().await {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!(target: "chapterkeep.quota", error = %e, "persisted query failed");
                false
            }
        }
    }

    /// Display-oriented summary of a fresh snapshot.
    pub async fn storage_info(&self) -> StorageInfo {
        let snapshot = self.probe().await;
        StorageInfo::from_snapshot(self.is_supported(), &snapshot)
    }
}
