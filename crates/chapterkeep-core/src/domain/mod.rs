//! Domain types for offline retention.
//!
//! Pure data types with no I/O dependencies.

mod item;
mod permission;
mod storage;

pub use item::{CatalogEntry, ContentItem, ItemId};
pub use permission::{PermissionRecord, PermissionState};
pub use storage::{
    CleanupOutcome, CleanupResult, QuotaLevel, QuotaSnapshot, QuotaWarning, SpaceDecision,
    StorageInfo,
};
