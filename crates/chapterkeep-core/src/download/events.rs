//! Offline events - discriminated union for progress and state changes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::summary::BatchSummary;
use crate::domain::{ItemId, QuotaWarning};

/// Status of a single item within a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Waiting for its turn.
    Pending,
    /// Currently being fetched.
    Downloading,
    /// Fetched, stored and registered.
    Completed,
    /// Fetch or registration failed.
    Error,
}

impl ItemStatus {
    /// String form used by adapters.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Whether no further updates will follow for this item.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// Progress of one item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadProgress {
    /// Item being processed.
    pub item_id: ItemId,
    /// Display name of the item.
    pub item_name: String,
    /// Completion percentage (0-100).
    pub percent: u8,
    /// Current status.
    pub status: ItemStatus,
    /// Error message when `status` is `Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadProgress {
    /// Create a progress record without an error.
    pub fn new(item_id: ItemId, item_name: impl Into<String>, percent: u8, status: ItemStatus) -> Self {
        Self {
            item_id,
            item_name: item_name.into(),
            percent: percent.min(100),
            status,
            error: None,
        }
    }

    /// Create an error record.
    pub fn failed(item_id: ItemId, item_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            item_id,
            item_name: item_name.into(),
            percent: 0,
            status: ItemStatus::Error,
            error: Some(error.into()),
        }
    }
}

/// Single discriminated union for all offline events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OfflineEvent {
    /// A batch passed its pre-flight checks and is about to fetch.
    BatchStarted {
        /// Identifier of this run.
        run_id: Uuid,
        /// Number of items requested.
        total_items: u32,
        /// Estimated bytes for the whole batch.
        required_bytes: u64,
    },

    /// Per-item progress.
    ItemProgress {
        /// Progress record.
        progress: DownloadProgress,
    },

    /// Share of requested items processed so far (0-100).
    OverallProgress {
        /// Identifier of this run.
        run_id: Uuid,
        /// Overall percentage.
        percent: u8,
    },

    /// The batch finished (possibly with failed items).
    BatchFinished {
        /// Final summary.
        summary: BatchSummary,
    },

    /// A cleanup pass ran.
    CleanupFinished {
        /// Estimated bytes reclaimed.
        freed_bytes: u64,
    },

    /// The host answered a durable-storage request.
    PermissionDecided {
        /// Outcome.
        granted: bool,
    },

    /// An item was removed from offline storage.
    ItemRemoved {
        /// Removed item.
        item_id: ItemId,
    },

    /// All offline items were removed.
    RegistryCleared {
        /// Number of items removed.
        removed: u32,
    },

    /// Storage pressure changed level.
    QuotaChanged {
        /// New observation.
        warning: QuotaWarning,
    },
}

impl OfflineEvent {
    /// Create an item progress event.
    pub const fn item(progress: DownloadProgress) -> Self {
        Self::ItemProgress { progress }
    }

    /// Create an overall progress event.
    #[must_use]
    pub const fn overall(run_id: Uuid, percent: u8) -> Self {
        Self::OverallProgress { run_id, percent }
    }

    /// Create a batch finished event.
    pub const fn finished(summary: BatchSummary) -> Self {
        Self::BatchFinished { summary }
    }

    /// Get the item id for item-scoped events.
    #[must_use]
    pub const fn item_id(&self) -> Option<ItemId> {
        match self {
            Self::ItemProgress { progress } => Some(progress.item_id),
            Self::ItemRemoved { item_id } => Some(*item_id),
            _ => None,
        }
    }

    /// Get the event name for wire protocols.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::BatchStarted { .. } => "offline:batch_started",
            Self::ItemProgress { .. } => "offline:item_progress",
            Self::OverallProgress { .. } => "offline:overall_progress",
            Self::BatchFinished { .. } => "offline:batch_finished",
            Self::CleanupFinished { .. } => "offline:cleanup_finished",
            Self::PermissionDecided { .. } => "offline:permission_decided",
            Self::ItemRemoved { .. } => "offline:item_removed",
            Self::RegistryCleared { .. } => "offline:registry_cleared",
            Self::QuotaChanged { .. } => "offline:quota_changed",
        }
    }
}
