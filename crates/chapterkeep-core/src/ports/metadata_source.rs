//! Metadata source port.

use async_trait::async_trait;

use super::PortError;
use crate::domain::ContentItem;

/// Source of the catalog of retainable items.
///
/// Failures (network, parse) are treated as an empty catalog by callers.
#[async_trait]
pub trait MetadataSourcePort: Send + Sync {
    /// List available items in catalog order.
    async fn list_items(&self) -> Result<Vec<ContentItem>, PortError>;
}
