//! Storage accounting types.

use serde::{Deserialize, Serialize};

/// Point-in-time view of the host storage quota.
///
/// Snapshots are recomputed on demand and never cached beyond a single
/// check: other processes can change usage between two calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    /// Total bytes the host allows this application to occupy.
    pub quota_bytes: u64,
    /// Bytes currently in use.
    pub used_bytes: u64,
    /// `quota - used`. May be negative when the host over-reports usage;
    /// use [`Self::reported_available`] for display.
    pub available_bytes: i64,
    /// Whether durable (eviction-resistant) storage has been granted.
    pub is_persistent: bool,
}

impl QuotaSnapshot {
    /// Build a snapshot from raw quota and usage figures.
    #[must_use]
    pub fn new(quota_bytes: u64, used_bytes: u64, is_persistent: bool) -> Self {
        let quota = i64::try_from(quota_bytes).unwrap_or(i64::MAX);
        let used = i64::try_from(used_bytes).unwrap_or(i64::MAX);
        Self {
            quota_bytes,
            used_bytes,
            available_bytes: quota.saturating_sub(used),
            is_persistent,
        }
    }

    /// The maximally constrained snapshot used when the host cannot answer.
    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            quota_bytes: 0,
            used_bytes: 0,
            available_bytes: 0,
            is_persistent: false,
        }
    }

    /// Available bytes clamped at zero.
    #[must_use]
    pub fn reported_available(&self) -> u64 {
        u64::try_from(self.available_bytes).unwrap_or(0)
    }

    /// Bytes still missing to store `required_bytes`, using the signed
    /// available figure.
    #[must_use]
    pub fn shortage_for(&self, required_bytes: u64) -> u64 {
        let required = i64::try_from(required_bytes).unwrap_or(i64::MAX);
        let missing = required.saturating_sub(self.available_bytes);
        u64::try_from(missing).unwrap_or(0)
    }

    /// Used share of the quota in whole percent, `None` for a zero quota.
    #[must_use]
    pub fn usage_percent(&self) -> Option<u8> {
        if self.quota_bytes == 0 {
            return None;
        }
        let percent = u128::from(self.used_bytes) * 100 / u128::from(self.quota_bytes);
        Some(u8::try_from(percent.min(100)).unwrap_or(100))
    }
}

/// Result of a space availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceDecision {
    /// `true` exactly when `shortage_bytes == 0`.
    pub has_enough_space: bool,
    /// Bytes still needed; 0 if sufficient.
    pub shortage_bytes: u64,
}

impl SpaceDecision {
    /// Derive a decision from a shortage amount.
    #[must_use]
    pub const fn from_shortage(shortage_bytes: u64) -> Self {
        Self {
            has_enough_space: shortage_bytes == 0,
            shortage_bytes,
        }
    }
}

/// Outcome of a reclamation pass.
///
/// `freed_bytes` is a conservative fixed-per-entry approximation, not a
/// measurement. It only gates the retry decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupResult {
    /// Estimated bytes reclaimed.
    pub freed_bytes: u64,
    /// Number of cache buckets deleted.
    pub buckets_deleted: u32,
    /// Number of key-value entries deleted.
    pub keys_deleted: u32,
}

/// Answer of `CleanupCoordinator::can_proceed_with_cleanup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupOutcome {
    /// Whether the requested bytes fit (before or after cleanup).
    pub can_download: bool,
    /// Whether a cleanup pass had to run.
    pub needs_cleanup: bool,
    /// Available bytes from the last check, clamped at zero.
    pub available_after_cleanup: u64,
    /// Estimated bytes reclaimed (0 when no cleanup ran).
    pub freed_bytes: u64,
    /// Shortage from the last check (0 when `can_download`).
    pub shortage_bytes: u64,
}

/// Display-oriented storage summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageInfo {
    /// Whether the host exposes storage accounting at all.
    pub supported: bool,
    /// Total quota in bytes.
    pub quota_bytes: u64,
    /// Used bytes.
    pub used_bytes: u64,
    /// Available bytes, clamped at zero.
    pub available_bytes: u64,
    /// Used share of the quota (0 when the quota is unknown).
    pub usage_percent: u8,
    /// Whether storage is durable.
    pub is_persistent: bool,
}

impl StorageInfo {
    /// Build a summary from a snapshot.
    #[must_use]
    pub fn from_snapshot(supported: bool, snapshot: &QuotaSnapshot) -> Self {
        Self {
            supported,
            quota_bytes: snapshot.quota_bytes,
            used_bytes: snapshot.used_bytes,
            available_bytes: snapshot.reported_available(),
            usage_percent: snapshot.usage_percent().unwrap_or(0),
            is_persistent: snapshot.is_persistent,
        }
    }
}

/// Storage pressure level reported by the quota monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaLevel {
    /// Usage below the warning threshold.
    Ok,
    /// Usage at or above the warning threshold.
    Low,
    /// Usage at or above the critical threshold.
    Critical,
    /// The host does not report a quota.
    Unsupported,
}

impl QuotaLevel {
    /// Classify a snapshot against warning thresholds (percent of quota).
    #[must_use]
    pub fn classify(
        supported: bool,
        snapshot: &QuotaSnapshot,
        warn_percent: u8,
        critical_percent: u8,
    ) -> Self {
        if !supported {
            return Self::Unsupported;
        }
        match snapshot.usage_percent() {
            None => Self::Unsupported,
            Some(p) if p >= critical_percent => Self::Critical,
            Some(p) if p >= warn_percent => Self::Low,
            Some(_) => Self::Ok,
        }
    }
}

/// A quota observation emitted when the pressure level changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaWarning {
    /// New pressure level.
    pub level: QuotaLevel,
    /// Used share of the quota.
    pub usage_percent: u8,
    /// Available bytes, clamped at zero.
    pub available_bytes: u64,
}
