//! # Lifecycle event listeners.
//!
//! A [`Subscribe`] implementation observes the start/stop sweep of a
//! [`Lifecycle`](crate::Lifecycle) and the shutdown outcome of every pool it owns.
//! Listeners are handed to [`LifecycleBuilder::with_subscribers`](crate::LifecycleBuilder::with_subscribers)
//! and stay attached for the lifetime of the lifecycle.
//!
//! ## What a listener sees during `run()`
//! ```text
//! ResourceStarting(a) ─► ResourceStarted(a) ─► ... ─► ShutdownRequested
//!   ─► ResourceStopping(z) ─► PoolDrained(z) ─► ResourceStopped(z)
//!                          └► GraceExceeded(z) ─► ResourceStopFailed(z) ─► ...
//! ```
//! Events reach each listener in publication order. Listeners do not wait on each
//! other, and the sweep never waits on a listener: `stop()` can return before the last
//! `ResourceStopped` has been handled.
//!
//! ## Losses
//! Events land in a bounded per-listener backlog sized by [`Subscribe::queue_capacity`].
//! When it is full the event is skipped for that listener only and a
//! `SubscriberOverflow` naming it is published. A panic inside `on_event` is caught
//! and reported as `SubscriberPanicked`; the listener keeps receiving later events.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use lifevisor::{Event, EventKind, Subscribe};
//!
//! struct PageOnStuckPools;
//!
//! #[async_trait]
//! impl Subscribe for PageOnStuckPools {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::GraceExceeded {
//!             eprintln!("pool {:?} abandoned work: {:?}", ev.resource, ev.reason);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "page-on-stuck-pools" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Listener for lifecycle and pool-shutdown events.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    ///
    /// Runs on a tokio task of the lifecycle's runtime, never on a pool worker thread.
    /// Blocking here only delays this listener's own backlog.
    async fn on_event(&self, event: &Event);

    /// Label used in `SubscriberOverflow` / `SubscriberPanicked` events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Backlog size before events are skipped; values below 1 count as 1.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
