//! Durable-storage permission types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current durable-storage grant as seen by callers.
///
/// `granted` always mirrors the host's live answer; `decided_at` is the
/// locally recorded time of the last explicit request, kept for audit/UX.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionState {
    /// Whether the host currently treats our storage as persistent.
    pub granted: bool,
    /// When the last grant request was decided, if one was ever made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

/// Persisted outcome of the last grant request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    /// Outcome reported by the host.
    pub granted: bool,
    /// When the outcome was recorded.
    pub decided_at: DateTime<Utc>,
}

impl PermissionRecord {
    /// Record an outcome at the current time.
    #[must_use]
    pub fn now(granted: bool) -> Self {
        Self {
            granted,
            decided_at: Utc::now(),
        }
    }
}
