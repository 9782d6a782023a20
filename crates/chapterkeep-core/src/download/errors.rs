//! Offline download error types.
//!
//! These errors are serializable and carry only strings and numbers, so
//! adapters can forward them across process or FFI boundaries unchanged.
//! Per-item fetch failures are not represented here: they are isolated in
//! the batch summary and never abort a batch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ItemId;
use crate::ports::RepositoryError;

/// Error type for batch-level offline operations.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OfflineError {
    /// No items were selected.
    #[error("No items selected")]
    NoSelection,

    /// The device has no connectivity.
    #[error("Device is offline")]
    Offline,

    /// Some requested ids are not in the catalog.
    #[error("Unknown items: {ids:?}")]
    UnknownItems {
        /// Ids that the metadata source did not list.
        ids: Vec<ItemId>,
    },

    /// Not enough space even after cleanup.
    #[error("Insufficient space: {shortage_bytes} more bytes needed")]
    InsufficientSpace {
        /// Bytes still missing.
        shortage_bytes: u64,
    },

    /// Durable storage has not been granted.
    #[error("Persistent storage permission required")]
    PermissionRequired,

    /// A stored payload could not be removed.
    #[error("Failed to remove item {id}: {message}")]
    RemovalFailed {
        /// Item whose payload removal failed.
        id: ItemId,
        /// Detailed error message.
        message: String,
    },

    /// The persisted registry could not be written.
    #[error("Registry error: {message}")]
    Registry {
        /// Detailed error message.
        message: String,
    },
}

/// Coarse classification, so callers can route the user to a remedy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Rejected before any side effect (nothing selected, offline, unknown ids).
    Precondition,
    /// Not enough space after cleanup.
    Capacity,
    /// Durable storage not granted.
    Permission,
    /// Payload or registry storage failed.
    Storage,
}

impl OfflineError {
    /// Create a removal failure.
    pub fn removal_failed(id: ItemId, message: impl Into<String>) -> Self {
        Self::RemovalFailed {
            id,
            message: message.into(),
        }
    }

    /// Create an insufficient space error.
    #[must_use]
    pub const fn insufficient_space(shortage_bytes: u64) -> Self {
        Self::InsufficientSpace { shortage_bytes }
    }

    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoSelection | Self::Offline | Self::UnknownItems { .. } => {
                ErrorKind::Precondition
            }
            Self::InsufficientSpace { .. } => ErrorKind::Capacity,
            Self::PermissionRequired => ErrorKind::Permission,
            Self::RemovalFailed { .. } | Self::Registry { .. } => ErrorKind::Storage,
        }
    }

    /// Convert to a user-friendly message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NoSelection => "Select at least one chapter to download.".to_string(),
            Self::Offline => "You are offline. Connect to the internet to download.".to_string(),
            Self::UnknownItems { ids } => {
                format!("Some chapters are no longer available: {ids:?}")
            }
            Self::InsufficientSpace { shortage_bytes } => {
                format!(
                    "Not enough storage space. Free up {} and try again.",
                    format_bytes(*shortage_bytes)
                )
            }
            Self::PermissionRequired => {
                "Allow persistent storage so downloaded chapters are not evicted.".to_string()
            }
            Self::RemovalFailed { id, .. } => format!("Could not remove chapter {id}."),
            Self::Registry { .. } => "Could not save the list of downloaded chapters.".to_string(),
        }
    }
}

impl From<RepositoryError> for OfflineError {
    fn from(err: RepositoryError) -> Self {
        Self::Registry {
            message: err.to_string(),
        }
    }
}

/// Convenience result type for offline operations.
pub type OfflineResult<T> = Result<T, OfflineError>;

/// Render a byte count with a binary unit suffix.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = OfflineError::insufficient_space(5 * 1024 * 1024);
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("insufficient_space"));
        assert!(json.contains("5242880"));

        let parsed: OfflineError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, err);
    }

    #[test]
    fn test_kinds_are_distinct_for_remedies() {
        assert_eq!(OfflineError::NoSelection.kind(), ErrorKind::Precondition);
        assert_eq!(OfflineError::Offline.kind(), ErrorKind::Precondition);
        assert_eq!(
            OfflineError::insufficient_space(1).kind(),
            ErrorKind::Capacity
        );
        assert_eq!(
            OfflineError::PermissionRequired.kind(),
            ErrorKind::Permission
        );
    }

    #[test]
    fn test_user_messages() {
        let err = OfflineError::insufficient_space(5 * 1024 * 1024);
        assert!(err.user_message().contains("5.0 MB"));
    }

    #[test]
    fn test_from_repository_error() {
        let err: OfflineError = RepositoryError::Storage("disk full".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
