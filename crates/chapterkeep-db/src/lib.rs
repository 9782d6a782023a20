//! `SQLite` persistence for chapterkeep.
//!
//! Provides [`SqliteRegistryStore`], the durable implementation of
//! `RegistryStorePort`, and the schema setup entry points.
#![deny(unsafe_code)]

pub mod repositories;
pub mod setup;

// Re-export repository implementations
pub use repositories::SqliteRegistryStore;

// Re-export setup functions for convenient access
pub use setup::setup_database;
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;
