//! Batch completion summary.
//!
//! A batch is never all-or-nothing: the summary lists what was stored and
//! what failed so callers can report partial success.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ItemId;

/// An item that failed during a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    /// Failed item.
    pub id: ItemId,
    /// Display name of the item.
    pub name: String,
    /// Failure description.
    pub error: String,
}

/// Outcome of one orchestrated batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Identifier of the run.
    pub run_id: Uuid,
    /// Number of items requested.
    pub requested: u32,
    /// Items stored and registered, in processing order.
    pub completed: Vec<ItemId>,
    /// Items that failed, in processing order.
    pub failed: Vec<FailedItem>,
    /// Final overall progress.
    pub overall_percent: u8,
}

impl BatchSummary {
    /// Start an empty summary for `requested` items.
    #[must_use]
    pub const fn new(run_id: Uuid, requested: u32) -> Self {
        Self {
            run_id,
            requested,
            completed: Vec::new(),
            failed: Vec::new(),
            overall_percent: 0,
        }
    }

    /// Number of completed items.
    #[must_use]
    pub fn completed_count(&self) -> u32 {
        u32::try_from(self.completed.len()).unwrap_or(u32::MAX)
    }

    /// Number of failed items.
    #[must_use]
    pub fn failed_count(&self) -> u32 {
        u32::try_from(self.failed.len()).unwrap_or(u32::MAX)
    }

    /// Every requested item was stored.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.completed_count() == self.requested
    }

    /// Some, but not all, items were stored.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.completed.is_empty() && !self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(id: ItemId) -> FailedItem {
        FailedItem {
            id,
            name: format!("Chapter {id}"),
            error: "network".to_string(),
        }
    }

    #[test]
    fn test_partial_summary() {
        let mut summary = BatchSummary::new(Uuid::nil(), 3);
        summary.completed = vec![1, 3];
        summary.failed = vec![failed(2)];

        assert!(summary.is_partial());
        assert!(!summary.is_complete_success());
        assert_eq!(summary.completed_count(), 2);
        assert_eq!(summary.failed_count(), 1);
    }

    #[test]
    fn test_all_failed_is_not_partial() {
        let mut summary = BatchSummary::new(Uuid::nil(), 1);
        summary.failed = vec![failed(1)];
        assert!(!summary.is_partial());
        assert!(!summary.is_complete_success());
    }
}
