//! Broadcast-based event emitter for [`ForesightEvent`] dispatch.

use std::sync::atomic::{AtomicU64, Ordering};

use foresight_core::events::ForesightEvent;
use metrics::counter;
use tokio::sync::broadcast;

/// Default broadcast channel capacity.
const DEFAULT_CAPACITY: usize = 1024;

/// Broadcast-based event emitter.
///
/// Non-blocking: `emit` never awaits. Slow receivers lag and drop events
/// rather than blocking the sender; a stalled observer must never stall
/// a workflow.
pub struct EventEmitter {
    tx: broadcast::Sender<ForesightEvent>,
    emit_count: AtomicU64,
}

impl EventEmitter {
    /// Create a new emitter with the default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new emitter with a custom channel capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            emit_count: AtomicU64::new(0),
        }
    }

    /// Emit an event to all subscribers. Non-blocking.
    ///
    /// Returns the number of receivers that received the event.
    /// Returns 0 if there are no active subscribers.
    pub fn emit(&self, event: ForesightEvent) -> usize {
        let _ = self.emit_count.fetch_add(1, Ordering::Relaxed);
        counter!("events_emitted_total").increment(1);
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to events. Returns a receiver that will receive
    /// all events emitted after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ForesightEvent> {
        self.tx.subscribe()
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the total number of events emitted.
    #[must_use]
    pub fn emit_count(&self) -> u64 {
        self.emit_count.load(Ordering::Relaxed)
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foresight_core::agents::AgentKind;
    use foresight_core::events::BaseEvent;

    fn thinking_event(workflow: &str) -> ForesightEvent {
        ForesightEvent::AgentThinking {
            base: BaseEvent::for_agent(AgentKind::TrendScanner, workflow),
            task: "scanning".into(),
        }
    }

    #[test]
    fn emit_with_no_subscribers() {
        let emitter = EventEmitter::new();
        let count = emitter.emit(thinking_event("wf_1"));
        assert_eq!(count, 0);
        assert_eq!(emitter.emit_count(), 1);
    }

    #[tokio::test]
    async fn emit_and_receive() {
        let emitter = EventEmitter::new();
        let mut rx = emitter.subscribe();

        let count = emitter.emit(thinking_event("wf_1"));
        assert_eq!(count, 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type(), "agent:thinking");
        assert_eq!(received.workflow(), Some("wf_1"));
    }

    #[tokio::test]
    async fn multiple_subscribers_each_receive() {
        let emitter = EventEmitter::new();
        let mut rx1 = emitter.subscribe();
        let mut rx2 = emitter.subscribe();

        assert_eq!(emitter.subscriber_count(), 2);
        assert_eq!(emitter.emit(thinking_event("wf_1")), 2);

        assert_eq!(rx1.recv().await.unwrap().workflow(), Some("wf_1"));
        assert_eq!(rx2.recv().await.unwrap().workflow(), Some("wf_1"));
    }

    #[tokio::test]
    async fn slow_receiver_lags_instead_of_blocking() {
        let emitter = EventEmitter::with_capacity(2);
        let mut rx = emitter.subscribe();

        // Emit 3 events into a capacity-2 channel
        let _ = emitter.emit(thinking_event("wf_1"));
        let _ = emitter.emit(thinking_event("wf_2"));
        let _ = emitter.emit(thinking_event("wf_3"));

        // Receiver observes the lag, producer was never blocked
        assert!(rx.recv().await.is_err());
    }

    #[test]
    fn subscriber_count_tracks_drops() {
        let emitter = EventEmitter::new();
        assert_eq!(emitter.subscriber_count(), 0);

        let rx1 = emitter.subscribe();
        let rx2 = emitter.subscribe();
        assert_eq!(emitter.subscriber_count(), 2);

        drop(rx1);
        drop(rx2);
        assert_eq!(emitter.subscriber_count(), 0);
    }
}
