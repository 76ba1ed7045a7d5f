//! # Non-blocking event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`]: distributes events to multiple subscribers
//! concurrently without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//!          (bounded)
//! ```
//!
//! ## Rules
//! - **No cross-subscriber ordering**: subscriber A may process event N while B processes N+5
//! - **Overflow**: event dropped for that subscriber only, `SubscriberOverflow` published
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Per-subscriber FIFO**: each subscriber sees events in order
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for multiple event subscribers.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let bus_for_worker = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());

                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = crate::pools::panic_message(&*panic_err);
                        bus_for_worker.publish(Event::subscriber_panicked(sub.name(), info));
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Emits an event to all subscribers without awaiting them.
    ///
    /// On a full or closed queue the event is dropped for that subscriber and a
    /// `SubscriberOverflow` is published (overflow events themselves are never re-reported).
    pub fn emit(&self, event: &Event) {
        let event = Arc::new(event.clone());
        let is_overflow_evt = event.is_subscriber_overflow();

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !is_overflow_evt {
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Returns the number of subscribers in the set.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns `true` if the set has no subscribers.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Gracefully shuts down all subscriber workers.
    ///
    /// Drops the senders, then waits for each worker to drain its queue.
    pub async fn shutdown(self) {
        drop(self.channels);

        for h in self.workers {
            let _ = h.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Forward(mpsc::UnboundedSender<EventKind>);

    #[async_trait]
    impl Subscribe for Forward {
        async fn on_event(&self, event: &Event) {
            let _ = self.0.send(event.kind);
        }

        fn name(&self) -> &'static str {
            "forward"
        }
    }

    struct Explodes;

    #[async_trait]
    impl Subscribe for Explodes {
        async fn on_event(&self, _event: &Event) {
            panic!("subscriber exploded");
        }

        fn name(&self) -> &'static str {
            "explodes"
        }
    }

    #[tokio::test]
    async fn delivers_in_fifo_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let set = SubscriberSet::new(vec![Arc::new(Forward(tx))], Bus::new(8));

        set.emit(&Event::new(EventKind::ResourceStarting));
        set.emit(&Event::new(EventKind::ResourceStarted));
        set.shutdown().await;

        assert_eq!(rx.recv().await, Some(EventKind::ResourceStarting));
        assert_eq!(rx.recv().await, Some(EventKind::ResourceStarted));
    }

    #[tokio::test]
    async fn panic_is_reported_on_the_bus() {
        let bus = Bus::new(8);
        let mut events = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Explodes)], bus.clone());

        set.emit(&Event::new(EventKind::ShutdownRequested));

        let ev = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("panic event in time")
            .unwrap();
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.resource.as_deref(), Some("explodes"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber exploded"));
    }
}
