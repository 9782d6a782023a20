//! Repository implementations using `SQLite`.
//!
//! The `SqlitePool` is confined to this module and never exposed through
//! the port trait signatures.

mod sqlite_registry_store;

pub use sqlite_registry_store::SqliteRegistryStore;
