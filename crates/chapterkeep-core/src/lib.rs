//! Core of chapterkeep: offline retention of content items under a host
//! storage quota.
//!
//! This crate owns the pure domain types, the port traits that describe the
//! host collaborators (metadata source, storage accounting, fetch-and-persist,
//! registry store), and the leaf services the download orchestrator composes:
//!
//! - `SizeEstimator` - predicted byte footprint of items
//! - `StorageQuotaProbe` - quota, usage and durability snapshot
//! - `SpaceAvailabilityChecker` - sufficiency and shortage decisions
//! - `CleanupCoordinator` - bounded best-effort reclamation
//! - `PermissionNegotiator` - durable-storage grant tracking
//! - `OfflineRegistry` - reconciled record of what is retained
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod download;
pub mod ports;
pub mod services;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types for convenience
pub use domain::{
    CatalogEntry, CleanupOutcome, CleanupResult, ContentItem, ItemId, PermissionRecord,
    PermissionState, QuotaLevel, QuotaSnapshot, QuotaWarning, SpaceDecision, StorageInfo,
};
pub use download::{
    BatchSummary, DownloadProgress, ErrorKind, FailedItem, ItemStatus, OfflineError,
    OfflineEvent, OfflineResult,
};
pub use ports::{
    AlwaysOnline, ChannelEventSink, ConnectivityPort, ContentFetchPort, MetadataSourcePort,
    NoopEventSink, OfflineEventSink, PortError, RegistryStorePort, RepositoryError,
    StorageAccountingPort,
};
pub use services::{
    CleanupCoordinator, OfflineRegistry, PermissionNegotiator, SizeEstimator,
    SpaceAvailabilityChecker, StorageQuotaProbe,
};
pub use settings::{
    CleanupSettings, EstimatorSettings, MonitorSettings, OfflineSettings, OrchestratorSettings,
    SettingsError, validate_settings,
};
