//! Quota pressure monitoring.
//!
//! Polls the storage probe on a fixed interval and yields a
//! [`QuotaWarning`] only when the pressure level changes. The monitor is
//! policy-free: it never cleans up or aborts batches on its own.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures_util::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use chapterkeep_core::domain::{QuotaLevel, QuotaWarning};
use chapterkeep_core::download::OfflineEvent;
use chapterkeep_core::ports::OfflineEventSink;
use chapterkeep_core::services::StorageQuotaProbe;
use chapterkeep_core::settings::MonitorSettings;

/// Shortest accepted poll interval.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Periodic quota probe that reports level changes.
pub struct QuotaMonitor {
    probe: StorageQuotaProbe,
    interval: Duration,
    warn_percent: u8,
    critical_percent: u8,
    cancel_token: CancellationToken,
}

impl QuotaMonitor {
    /// Create a monitor using the poll interval and thresholds from `settings`.
    pub fn new(
        probe: StorageQuotaProbe,
        settings: MonitorSettings,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            probe,
            interval: settings.poll_interval(),
            warn_percent: settings.warn_percent,
            critical_percent: settings.critical_percent,
            cancel_token,
        }
    }

    /// Override the poll interval. Zero is raised to one millisecond.
    #[must_use]
    pub fn with_interval(mut self, poll_interval: Duration) -> Self {
        self.interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Probe once and classify the result.
    pub async fn check(&self) -> QuotaWarning {
        let snapshot = self.probe.probe().await;
        QuotaWarning {
            level: QuotaLevel::classify(
                self.probe.is_supported(),
                &snapshot,
                self.warn_percent,
                self.critical_percent,
            ),
            usage_percent: snapshot.usage_percent().unwrap_or(0),
            available_bytes: snapshot.reported_available(),
        }
    }

    /// Start polling and return a stream of level changes.
    ///
    /// The first probe always yields. The stream completes when the
    /// cancellation token fires.
    pub fn monitor(self) -> impl Stream<Item = QuotaWarning> {
        let cancel_token = self.cancel_token.clone();
        let poll_interval = self.interval;

        stream! {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let mut last_level: Option<QuotaLevel> = None;
            debug!(target: "chapterkeep.monitor", ?poll_interval, "starting quota monitor");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let warning = self.check().await;
                        if last_level != Some(warning.level) {
                            debug!(
                                target: "chapterkeep.monitor",
                                level = ?warning.level,
                                previous = ?last_level,
                                usage_percent = warning.usage_percent,
                                "quota level changed"
                            );
                            last_level = Some(warning.level);
                            yield warning;
                        }
                    }
                    () = cancel_token.cancelled() => {
                        debug!(target: "chapterkeep.monitor", "quota monitor cancelled");
                        break;
                    }
                }
            }
        }
    }

    /// Run the monitor on the current runtime, forwarding changes to `events`.
    pub fn spawn(self, events: Arc<dyn OfflineEventSink>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let stream = self.monitor();
            futures_util::pin_mut!(stream);
            while let Some(warning) = stream.next().await {
                events.emit(OfflineEvent::QuotaChanged { warning });
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chapterkeep_core::ports::StorageAccountingPort;
    use chapterkeep_core::testing::{InMemoryStorage, MB, RecordingSink};

    fn monitor(storage: &Arc<InMemoryStorage>, cancel: CancellationToken) -> QuotaMonitor {
        let port: Arc<dyn StorageAccountingPort> = storage.clone();
        QuotaMonitor::new(StorageQuotaProbe::new(port), MonitorSettings::default(), cancel)
            .with_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_check_classifies_usage() {
        let storage = Arc::new(InMemoryStorage::new(100 * MB, 85 * MB));
        let warning = monitor(&storage, CancellationToken::new()).check().await;
        assert_eq!(warning.level, QuotaLevel::Low);
        assert_eq!(warning.usage_percent, 85);
        assert_eq!(warning.available_bytes, 15 * MB);
    }

    #[tokio::test]
    async fn test_yields_only_on_level_change() {
        let storage = Arc::new(InMemoryStorage::new(100 * MB, 10 * MB));
        let cancel = CancellationToken::new();
        let stream = monitor(&storage, cancel.clone()).monitor();
        futures_util::pin_mut!(stream);

        let first = stream.next().await.unwrap();
        assert_eq!(first.level, QuotaLevel::Ok);

        // Same level, different usage: no event
        storage.set_used(20 * MB);
        tokio::time::sleep(Duration::from_millis(30)).await;
        storage.set_used(96 * MB);

        let second = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.level, QuotaLevel::Critical);
        assert_eq!(second.usage_percent, 96);

        cancel.cancel();
        let end = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .unwrap();
        assert!(end.is_none());
    }

    #[tokio::test]
    async fn test_zero_interval_still_polls() {
        let storage = Arc::new(InMemoryStorage::new(100 * MB, 10 * MB));
        let port: Arc<dyn StorageAccountingPort> = storage.clone();
        let settings = MonitorSettings {
            poll_interval_secs: 0,
            ..MonitorSettings::default()
        };
        let monitor = QuotaMonitor::new(
            StorageQuotaProbe::new(port),
            settings,
            CancellationToken::new(),
        );
        assert_eq!(monitor.interval, Duration::from_secs(1));

        let stream = monitor.with_interval(Duration::ZERO).monitor();
        futures_util::pin_mut!(stream);
        let first = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.level, QuotaLevel::Ok);
    }

    #[tokio::test]
    async fn test_unsupported_host() {
        let storage = Arc::new(InMemoryStorage::unsupported());
        let warning = monitor(&storage, CancellationToken::new()).check().await;
        assert_eq!(warning.level, QuotaLevel::Unsupported);
        assert_eq!(warning.available_bytes, 0);
    }

    #[tokio::test]
    async fn test_spawn_forwards_to_sink() {
        let storage = Arc::new(InMemoryStorage::new(100 * MB, 99 * MB));
        let cancel = CancellationToken::new();
        let sink = RecordingSink::new();
        let handle = monitor(&storage, cancel.clone()).spawn(Arc::new(sink.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        handle.await.unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            OfflineEvent::QuotaChanged { warning } if warning.level == QuotaLevel::Critical
        ));
    }
}
