//! # Event bus for broadcasting lifecycle events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from multiple sources (the lifecycle sweep, pool
//! adapters, subscriber workers).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                    Subscriber (one):
//!   Lifecycle       ──┐
//!   ExecutorManager ──┼──────► Bus ───► subscriber_listener ────► SubscriberSet
//!   SubscriberSet   ──┘  (broadcast chan)  (in Lifecycle)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks, so it is safe from worker threads.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active subscribers at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for lifecycle events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receiver_sees_events_published_after_subscribe() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::ShutdownRequested));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::ResourceStarting).with_resource("db"));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::ResourceStarting);
        assert_eq!(ev.resource.as_deref(), Some("db"));
    }
}
