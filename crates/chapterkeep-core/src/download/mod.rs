//! Download domain types, events and errors.
//!
//! # Structure
//!
//! - `events` - Item status, progress records and `OfflineEvent`
//! - `errors` - Batch-level error taxonomy
//! - `summary` - Batch completion summary

pub mod errors;
pub mod events;
pub mod summary;

pub use errors::{ErrorKind, OfflineError, OfflineResult, format_bytes};
pub use events::{DownloadProgress, ItemStatus, OfflineEvent};
pub use summary::{BatchSummary, FailedItem};
