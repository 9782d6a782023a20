//! Download orchestration for chapterkeep.
//!
//! Composes the leaf services from `chapterkeep-core` into the end-to-end
//! "download these chapters for offline use" flow.
//!
//! # Modules
//!
//! - `orchestrator` - pre-flight checks, sequential fetch and registration
//! - `progress` - throttled, monotonic per-item progress forwarding
//! - `monitor` - periodic quota pressure warnings
#![deny(unused_crate_dependencies)]

// Re-export core types for convenience
pub use chapterkeep_core::download::{
    BatchSummary, DownloadProgress, FailedItem, ItemStatus, OfflineError, OfflineEvent,
    OfflineResult,
};
pub use chapterkeep_core::ports::{
    ConnectivityPort, ContentFetchPort, MetadataSourcePort, OfflineEventSink, RegistryStorePort,
    StorageAccountingPort,
};

pub(crate) mod progress;

pub use progress::ProgressThrottle;

mod orchestrator;

pub use orchestrator::{DownloadOrchestrator, DownloadOrchestratorDeps, build_orchestrator};

mod monitor;

pub use monitor::QuotaMonitor;

// Silence unused dev-dependency warnings; these are used by integration tests
#[cfg(test)]
use tokio_test as _;
#[cfg(test)]
use tracing_subscriber as _;
