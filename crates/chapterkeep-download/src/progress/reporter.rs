//! Per-item progress forwarding.
//!
//! Wraps the callback handed to `ContentFetchPort::fetch_and_store`. Raw
//! percentages are clamped, made monotonic and rate-limited before they
//! reach the event sink. 100 is reserved for the `Completed` event, which
//! is only emitted once the item is registered.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use chapterkeep_core::download::{DownloadProgress, ItemStatus, OfflineEvent};
use chapterkeep_core::domain::ContentItem;
use chapterkeep_core::ports::OfflineEventSink;

use super::ProgressThrottle;

/// Highest percentage reported while an item is still in flight.
const IN_FLIGHT_CEILING: u8 = 99;

/// Forwards fetch progress for one item.
pub(crate) struct ItemProgressReporter<'a> {
    item: &'a ContentItem,
    events: Arc<dyn OfflineEventSink>,
    throttle: Mutex<ProgressThrottle>,
    last_percent: AtomicU8,
}

impl<'a> ItemProgressReporter<'a> {
    pub(crate) fn new(
        item: &'a ContentItem,
        events: Arc<dyn OfflineEventSink>,
        throttle: ProgressThrottle,
    ) -> Self {
        Self {
            item,
            events,
            throttle: Mutex::new(throttle),
            last_percent: AtomicU8::new(0),
        }
    }

    /// Handle one raw percentage from the fetch adapter.
    pub(crate) fn report(&self, percent: u8) {
        let percent = percent.min(IN_FLIGHT_CEILING);
        let previous = self.last_percent.fetch_max(percent, Ordering::AcqRel);
        if percent <= previous {
            return;
        }

        // A poisoned throttle only loses rate limiting
        let allowed = self
            .throttle
            .lock()
            .map_or(true, |mut throttle| throttle.should_emit());
        if allowed {
            self.events.emit(OfflineEvent::item(DownloadProgress::new(
                self.item.id,
                self.item.name.clone(),
                percent,
                ItemStatus::Downloading,
            )));
        }
    }

    /// Highest percentage seen so far.
    pub(crate) fn last_percent(&self) -> u8 {
        self.last_percent.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chapterkeep_core::testing::RecordingSink;

    fn percents(sink: &RecordingSink) -> Vec<u8> {
        sink.events()
            .into_iter()
            .filter_map(|event| match event {
                OfflineEvent::ItemProgress { progress } => Some(progress.percent),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_regressions_are_dropped() {
        let item = ContentItem::new(1, "Chapter 1", 10);
        let sink = RecordingSink::new();
        let reporter =
            ItemProgressReporter::new(&item, Arc::new(sink.clone()), ProgressThrottle::unthrottled());

        for p in [10, 40, 30, 40, 60] {
            reporter.report(p);
        }
        assert_eq!(percents(&sink), vec![10, 40, 60]);
        assert_eq!(reporter.last_percent(), 60);
    }

    #[test]
    fn test_hundred_is_held_back() {
        let item = ContentItem::new(1, "Chapter 1", 10);
        let sink = RecordingSink::new();
        let reporter =
            ItemProgressReporter::new(&item, Arc::new(sink.clone()), ProgressThrottle::unthrottled());

        reporter.report(100);
        reporter.report(250);
        assert_eq!(percents(&sink), vec![99]);
    }

    #[test]
    fn test_throttled_updates_are_skipped() {
        let item = ContentItem::new(1, "Chapter 1", 10);
        let sink = RecordingSink::new();
        let reporter = ItemProgressReporter::new(
            &item,
            Arc::new(sink.clone()),
            ProgressThrottle::new(std::time::Duration::from_secs(60)),
        );

        reporter.report(10);
        reporter.report(20);
        reporter.report(30);
        assert_eq!(percents(&sink), vec![10]);
        assert_eq!(reporter.last_percent(), 30);
    }
}
