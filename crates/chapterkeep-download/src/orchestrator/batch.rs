//! Sequential batch execution.
//!
//! Items are fetched one at a time in request order. A failed item is
//! recorded and the loop moves on; nothing here returns an error.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use chapterkeep_core::domain::ContentItem;
use chapterkeep_core::download::{
    BatchSummary, DownloadProgress, FailedItem, ItemStatus, OfflineEvent,
};

use super::DownloadOrchestrator;
use crate::progress::{ItemProgressReporter, ProgressThrottle};

/// `round(100 * done / total)`, half rounding up.
fn overall_percent(done: u32, total: u32) -> u8 {
    if total == 0 {
        return 100;
    }
    let rounded = (u64::from(done) * 100 + u64::from(total) / 2) / u64::from(total);
    u8::try_from(rounded.min(100)).unwrap_or(100)
}

impl DownloadOrchestrator {
    pub(super) async fn run_batch(&self, items: Vec<ContentItem>, required_bytes: u64) -> BatchSummary {
        let run_id = Uuid::new_v4();
        let total = u32::try_from(items.len()).unwrap_or(u32::MAX);
        let mut summary = BatchSummary::new(run_id, total);

        info!(
            target: "chapterkeep.download",
            %run_id,
            total_items = total,
            required_bytes,
            "batch started"
        );
        self.events.emit(OfflineEvent::BatchStarted {
            run_id,
            total_items: total,
            required_bytes,
        });
        for item in &items {
            self.events.emit(OfflineEvent::item(DownloadProgress::new(
                item.id,
                item.name.clone(),
                0,
                ItemStatus::Pending,
            )));
        }

        let mut attempted = 0u32;
        for item in &items {
            match self.process_item(item).await {
                Ok(()) => summary.completed.push(item.id),
                Err(error) => summary.failed.push(FailedItem {
                    id: item.id,
                    name: item.name.clone(),
                    error,
                }),
            }

            attempted += 1;
            summary.overall_percent = overall_percent(attempted, total);
            self.events
                .emit(OfflineEvent::overall(run_id, summary.overall_percent));
        }

        if let Err(e) = self.registry.persist().await {
            warn!(target: "chapterkeep.download", %run_id, error = %e, "failed to persist registry");
        }

        info!(
            target: "chapterkeep.download",
            %run_id,
            completed = summary.completed_count(),
            failed = summary.failed_count(),
            "batch finished"
        );
        self.events.emit(OfflineEvent::finished(summary.clone()));
        summary
    }

    /// Fetch and register one item, emitting its terminal status.
    async fn process_item(&self, item: &ContentItem) -> Result<(), String> {
        self.events.emit(OfflineEvent::item(DownloadProgress::new(
            item.id,
            item.name.clone(),
            0,
            ItemStatus::Downloading,
        )));

        let result = self.fetch_and_register(item).await;
        match &result {
            Ok(()) => {
                debug!(target: "chapterkeep.download", item_id = item.id, "item completed");
                self.events.emit(OfflineEvent::item(DownloadProgress::new(
                    item.id,
                    item.name.clone(),
                    100,
                    ItemStatus::Completed,
                )));
            }
            Err(error) => {
                warn!(target: "chapterkeep.download", item_id = item.id, error = %error, "item failed");
                // A stale entry from an earlier batch must not outlive a failed refetch
                if let Err(e) = self.registry.remove(item.id).await {
                    warn!(target: "chapterkeep.download", item_id = item.id, error = %e, "failed to unregister failed item");
                }
                self.events.emit(OfflineEvent::item(DownloadProgress::failed(
                    item.id,
                    item.name.clone(),
                    error.clone(),
                )));
            }
        }
        result
    }

    async fn fetch_and_register(&self, item: &ContentItem) -> Result<(), String> {
        let reporter = ItemProgressReporter::new(
            item,
            Arc::clone(&self.events),
            ProgressThrottle::new(self.settings.progress_interval()),
        );
        let on_progress = |percent: u8| reporter.report(percent);

        if let Err(e) = self.fetcher.fetch_and_store(item.id, &on_progress).await {
            debug!(
                target: "chapterkeep.download",
                item_id = item.id,
                reached_percent = reporter.last_percent(),
                "fetch aborted"
            );
            return Err(e.to_string());
        }

        self.registry
            .add(item.id)
            .await
            .map_err(|e| format!("stored but not registered: {e}"))
    }
}
