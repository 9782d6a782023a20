//! Settings domain types and validation.
//!
//! The tunable constants of the offline subsystem live here so they can be
//! adjusted without touching callers. All sections deserialize with
//! defaults, so a partial settings document is valid input.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default estimated bytes per content unit.
pub const DEFAULT_PER_UNIT_COST: u64 = 200;

/// Default fixed per-item overhead (metadata, index entries).
pub const DEFAULT_FIXED_OVERHEAD: u64 = 2048;

/// Default bytes credited for each deleted cache bucket.
pub const DEFAULT_BUCKET_ESTIMATE: u64 = 1024 * 1024;

/// Default bytes credited for each deleted key-value entry.
pub const DEFAULT_KEY_ESTIMATE: u64 = 1024;

/// Size estimation constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EstimatorSettings {
    /// Bytes per content unit.
    pub per_unit_cost: u64,
    /// Fixed bytes added once per item.
    pub fixed_overhead: u64,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            per_unit_cost: DEFAULT_PER_UNIT_COST,
            fixed_overhead: DEFAULT_FIXED_OVERHEAD,
        }
    }
}

/// Reclamation heuristics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CleanupSettings {
    /// Substrings marking a cache bucket as stale.
    pub stale_bucket_patterns: Vec<String>,
    /// Substrings marking a key-value entry as temporary.
    pub temporary_key_patterns: Vec<String>,
    /// Bytes credited per deleted bucket.
    pub bucket_estimate_bytes: u64,
    /// Bytes credited per deleted key.
    pub key_estimate_bytes: u64,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            stale_bucket_patterns: vec!["old".to_string(), "temp".to_string()],
            temporary_key_patterns: vec!["temp".to_string(), "cache".to_string()],
            bucket_estimate_bytes: DEFAULT_BUCKET_ESTIMATE,
            key_estimate_bytes: DEFAULT_KEY_ESTIMATE,
        }
    }
}

/// Download orchestration behaviour.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Ask the host for durable storage before failing a batch with
    /// `PermissionRequired`.
    pub request_persistence_automatically: bool,
    /// Minimum interval between intermediate per-item progress events.
    pub progress_interval_ms: u64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            request_persistence_automatically: false,
            progress_interval_ms: 100,
        }
    }
}

impl OrchestratorSettings {
    /// Progress throttle interval as a `Duration`.
    #[must_use]
    pub const fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

/// Quota warning polling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MonitorSettings {
    /// Seconds between quota probes.
    pub poll_interval_secs: u64,
    /// Usage percentage that raises a low-space warning.
    pub warn_percent: u8,
    /// Usage percentage that raises a critical warning.
    pub critical_percent: u8,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            warn_percent: 80,
            critical_percent: 95,
        }
    }
}

impl MonitorSettings {
    /// Poll interval as a `Duration`, never shorter than one second.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        if self.poll_interval_secs == 0 {
            Duration::from_secs(1)
        } else {
            Duration::from_secs(self.poll_interval_secs)
        }
    }
}

/// Settings for the whole offline subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OfflineSettings {
    /// Size estimation constants.
    pub estimator: EstimatorSettings,
    /// Which buckets and keys a cleanup pass may delete.
    pub cleanup: CleanupSettings,
    /// Batch behaviour and progress throttling.
    pub orchestrator: OrchestratorSettings,
    /// Quota warning thresholds and polling.
    pub monitor: MonitorSettings,
}

impl OfflineSettings {
    /// Create settings with the shipped defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Per-unit cost must be greater than zero")]
    ZeroUnitCost,

    #[error("Cleanup pattern list `{0}` must not be empty or contain blank patterns")]
    InvalidPatterns(&'static str),

    #[error("Warning thresholds must satisfy 1 <= warn < critical <= 100, got {warn} and {critical}")]
    InvalidThresholds { warn: u8, critical: u8 },

    #[error("Poll interval must be at least 1 second")]
    PollIntervalTooShort,

    #[error("Progress interval must be at most 10000 ms, got {0}")]
    ProgressIntervalTooLong(u64),
}

fn patterns_valid(patterns: &[String]) -> bool {
    !patterns.is_empty() && patterns.iter().all(|p| !p.trim().is_empty())
}

/// Validate settings values.
pub fn validate_settings(settings: &OfflineSettings) -> Result<(), SettingsError> {
    if settings.estimator.per_unit_cost == 0 {
        return Err(SettingsError::ZeroUnitCost);
    }

    if !patterns_valid(&settings.cleanup.stale_bucket_patterns) {
        return Err(SettingsError::InvalidPatterns("stale_bucket_patterns"));
    }
    if !patterns_valid(&settings.cleanup.temporary_key_patterns) {
        return Err(SettingsError::InvalidPatterns("temporary_key_patterns"));
    }

    let MonitorSettings {
        warn_percent,
        critical_percent,
        poll_interval_secs,
    } = settings.monitor;
    if warn_percent == 0 || warn_percent >= critical_percent || critical_percent > 100 {
        return Err(SettingsError::InvalidThresholds {
            warn: warn_percent,
            critical: critical_percent,
        });
    }
    if poll_interval_secs == 0 {
        return Err(SettingsError::PollIntervalTooShort);
    }

    if settings.orchestrator.progress_interval_ms > 10_000 {
        return Err(SettingsError::ProgressIntervalTooLong(
            settings.orchestrator.progress_interval_ms,
        ));
    }

    Ok(())
}
