//! Space sufficiency checks.

use tracing::debug;

use super::StorageQuotaProbe;
use crate::domain::{QuotaSnapshot, SpaceDecision};

/// Decides whether `required_bytes` fit in the current quota.
///
/// Every check re-probes: quota can change between calls.
#[derive(Clone)]
pub struct SpaceAvailabilityChecker {
    probe: StorageQuotaProbe,
}

impl SpaceAvailabilityChecker {
    /// Create a checker over a quota probe.
    pub const fn new(probe: StorageQuotaProbe) -> Self {
        Self { probe }
    }

    /// Check whether `required_bytes` fit.
    pub async fn check(&self, required_bytes: u64) -> SpaceDecision {
        self.check_with_snapshot(required_bytes).await.0
    }

    /// Check and also return the snapshot the decision was based on.
    pub async fn check_with_snapshot(&self, required_bytes: u64) -> (SpaceDecision, QuotaSnapshot) {
        let snapshot = self.probe.probe().await;
        let decision = SpaceDecision::from_shortage(snapshot.shortage_for(required_bytes));
        debug!(
            target: "chapterkeep.space",
            required_bytes,
            available_bytes = snapshot.available_bytes,
            shortage_bytes = decision.shortage_bytes,
            "space checked"
        );
        (decision, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryStorage, MB};
    use std::sync::Arc;

    fn checker(storage: Arc<InMemoryStorage>) -> SpaceAvailabilityChecker {
        SpaceAvailabilityChecker::new(StorageQuotaProbe::new(storage))
    }

    #[tokio::test]
    async fn test_sufficient_space() {
        let checker = checker(Arc::new(InMemoryStorage::new(10 * MB, 2 * MB)));
        let decision = checker.check(8 * MB).await;
        assert!(decision.has_enough_space);
        assert_eq!(decision.shortage_bytes, 0);
    }

    #[tokio::test]
    async fn test_shortage_is_reported() {
        let checker = checker(Arc::new(InMemoryStorage::new(10 * MB, 0)));
        let decision = checker.check(15 * MB).await;
        assert!(!decision.has_enough_space);
        assert_eq!(decision.shortage_bytes, 5 * MB);
    }

    #[tokio::test]
    async fn test_sufficiency_matches_zero_shortage() {
        let checker = checker(Arc::new(InMemoryStorage::new(10 * MB, 3 * MB)));
        for required in [0, 1, 7 * MB - 1, 7 * MB, 7 * MB + 1, 100 * MB] {
            let decision = checker.check(required).await;
            assert_eq!(decision.has_enough_space, decision.shortage_bytes == 0);
        }
    }

    #[tokio::test]
    async fn test_every_check_reprobes() {
        let storage = Arc::new(InMemoryStorage::new(10 * MB, 0));
        let checker = checker(Arc::clone(&storage));
        assert!(checker.check(5 * MB).await.has_enough_space);

        storage.set_used(8 * MB);
        assert_eq!(checker.check(5 * MB).await.shortage_bytes, 3 * MB);
    }

    #[tokio::test]
    async fn test_unsupported_host_cannot_fit_anything() {
        let checker = checker(Arc::new(InMemoryStorage::unsupported()));
        let decision = checker.check(1).await;
        assert!(!decision.has_enough_space);
        assert_eq!(decision.shortage_bytes, 1);
        // A zero-byte request trivially fits even a zero quota
        assert!(checker.check(0).await.has_enough_space);
    }
}
