//! Content item types.

use serde::{Deserialize, Serialize};

/// Identifier of a content item (chapter number in the source catalog).
pub type ItemId = u32;

/// A unit of retainable content, as described by the metadata source.
///
/// Items are immutable once listed; the only size-relevant attribute is
/// `unit_count` (verses, paragraphs, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentItem {
    /// Stable identifier.
    pub id: ItemId,
    /// Human-readable name (e.g. "Chapter 3").
    pub name: String,
    /// Number of size-relevant units in the item.
    pub unit_count: u32,
}

impl ContentItem {
    /// Create a new content item.
    pub fn new(id: ItemId, name: impl Into<String>, unit_count: u32) -> Self {
        Self {
            id,
            name: name.into(),
            unit_count,
        }
    }
}

/// A catalog item annotated with its offline state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// The listed item.
    pub item: ContentItem,
    /// Predicted storage footprint in bytes.
    pub estimated_bytes: u64,
    /// Whether the item is registered and its payload still validates.
    pub downloaded: bool,
}
