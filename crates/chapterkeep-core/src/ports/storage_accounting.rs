//! Storage accounting port.
//!
//! Abstracts the host's quota/usage estimate, the durable-storage grant and
//! the two reclaimable surfaces (named cache buckets and key-value entries).

use async_trait::async_trait;

use super::PortError;

/// Port for the host storage-accounting capability.
///
/// Hosts without the capability return `false` from [`is_supported`]; the
/// core then behaves as if storage were full and not persistent.
///
/// [`is_supported`]: StorageAccountingPort::is_supported
#[async_trait]
pub trait StorageAccountingPort: Send + Sync {
    /// Whether the capability is available at all.
    fn is_supported(&self) -> bool;

    /// Current `(quota, used)` in bytes.
    async fn quota_and_usage(&self) -> Result<(u64, u64), PortError>;

    /// Whether durable storage has been granted.
    async fn is_persisted(&self) -> Result<bool, PortError>;

    /// Ask the host for durable storage. Returns the decision.
    async fn request_persist(&self) -> Result<bool, PortError>;

    /// Names of all cache buckets.
    async fn cache_buckets(&self) -> Result<Vec<String>, PortError>;

    /// Delete a cache bucket and everything in it.
    async fn delete_cache_bucket(&self, name: &str) -> Result<(), PortError>;

    /// All key-value entry keys.
    async fn keys(&self) -> Result<Vec<String>, PortError>;

    /// Delete one key-value entry.
    async fn delete_key(&self, key: &str) -> Result<(), PortError>;
}
