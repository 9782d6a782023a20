//! Storage footprint estimation.

use crate::domain::ContentItem;
use crate::settings::EstimatorSettings;

/// Predicts how many bytes an item occupies once stored.
///
/// `estimate(units) = units * per_unit_cost + fixed_overhead`; estimates of
/// several items are the sum of the individual estimates (each item pays
/// its own overhead).
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeEstimator {
    settings: EstimatorSettings,
}

impl SizeEstimator {
    /// Create an estimator from settings.
    #[must_use]
    pub const fn new(settings: EstimatorSettings) -> Self {
        Self { settings }
    }

    /// Estimated bytes for one item with `unit_count` units.
    #[must_use]
    pub const fn estimate(&self, unit_count: u32) -> u64 {
        (unit_count as u64)
            .saturating_mul(self.settings.per_unit_cost)
            .saturating_add(self.settings.fixed_overhead)
    }

    /// Estimated bytes for a single item.
    #[must_use]
    pub const fn estimate_item(&self, item: &ContentItem) -> u64 {
        self.estimate(item.unit_count)
    }

    /// Sum of the estimates of all `items`.
    pub fn estimate_many<'a, I>(&self, items: I) -> u64
    where
        I: IntoIterator<Item = &'a ContentItem>,
    {
        items
            .into_iter()
            .fold(0u64, |total, item| total.saturating_add(self.estimate_item(item)))
    }
}
