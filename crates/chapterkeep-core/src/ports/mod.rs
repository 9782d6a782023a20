//! Port definitions (trait abstractions) for host collaborators.
//!
//! Ports define the interfaces the core expects from the host platform.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - Every host call is fallible; services convert failures into safe
//!   defaults at their boundary instead of propagating them
//! - Persistence formats belong to the implementations, not the core
//! - Traits are minimal and intent-based

pub mod connectivity;
pub mod content_fetch;
pub mod event_sink;
pub mod metadata_source;
pub mod registry_store;
pub mod storage_accounting;

use thiserror::Error;

pub use connectivity::{AlwaysOnline, ConnectivityPort};
pub use content_fetch::ContentFetchPort;
pub use event_sink::{ChannelEventSink, NoopEventSink, OfflineEventSink};
pub use metadata_source::MetadataSourcePort;
pub use registry_store::RegistryStorePort;
pub use storage_accounting::StorageAccountingPort;

/// Errors reported by host capabilities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PortError {
    /// The capability does not exist on this host.
    #[error("Capability not supported")]
    Unsupported,

    /// The host rejected the call.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// The addressed entry does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or transport failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Local I/O failure.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error.
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// General/uncategorized error.
    #[error("{0}")]
    Other(String),
}

/// Errors from the persisted registry store.
///
/// Abstracts storage implementation details (e.g. sqlx errors).
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Storage backend error (database, filesystem, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
