//! Offline event sink port.
//!
//! This port abstracts event delivery, allowing the orchestrator to report
//! progress without coupling to a transport (channels, IPC, UI bindings).

use tokio::sync::mpsc;

use crate::download::OfflineEvent;

/// Port for emitting offline events.
///
/// Implementations must not block.
pub trait OfflineEventSink: Send + Sync {
    /// Emit an event.
    fn emit(&self, event: OfflineEvent);

    /// Clone this sink into a boxed trait object.
    fn clone_box(&self) -> Box<dyn OfflineEventSink>;
}

/// A sink that discards all events (tests, headless contexts).
#[derive(Debug, Clone, Default)]
pub struct NoopEventSink;

impl NoopEventSink {
    /// Create a new no-op sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl OfflineEventSink for NoopEventSink {
    fn emit(&self, _event: OfflineEvent) {}

    fn clone_box(&self) -> Box<dyn OfflineEventSink> {
        Box::new(self.clone())
    }
}

/// Sink that forwards events into an unbounded channel.
///
/// Events emitted after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<OfflineEvent>,
}

impl ChannelEventSink {
    /// Create a sink and the receiver consumers subscribe on.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OfflineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl OfflineEventSink for ChannelEventSink {
    fn emit(&self, event: OfflineEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!(target: "chapterkeep.events", "event receiver dropped");
        }
    }

    fn clone_box(&self) -> Box<dyn OfflineEventSink> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_noop_sink() {
        let sink: Arc<dyn OfflineEventSink> = Arc::new(NoopEventSink::new());
        sink.emit(OfflineEvent::ItemRemoved { item_id: 1 });
        let _boxed = sink.clone_box();
    }

    #[test]
    fn test_channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelEventSink::channel();
        sink.emit(OfflineEvent::ItemRemoved { item_id: 1 });
        sink.clone_box().emit(OfflineEvent::ItemRemoved { item_id: 2 });

        assert_eq!(rx.try_recv().unwrap().item_id(), Some(1));
        assert_eq!(rx.try_recv().unwrap().item_id(), Some(2));
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelEventSink::channel();
        drop(rx);
        sink.emit(OfflineEvent::RegistryCleared { removed: 0 });
    }
}
