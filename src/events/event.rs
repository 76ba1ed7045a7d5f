//! # Lifecycle events emitted by the lifecycle and its pool adapters.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Resource events**: the start/stop sweep over managed resources
//! - **Pool events**: how a pool adapter finished its shutdown (drained, escalated, interrupted)
//! - **Subscriber events**: delivery problems of subscribers themselves
//!
//! The [`Event`] struct carries additional metadata such as timestamps, resource name,
//! reasons, and grace periods.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use lifevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::GraceExceeded)
//!     .with_resource("jobs-%d")
//!     .with_reason("2 worker(s) stuck")
//!     .with_grace(Duration::from_millis(100));
//!
//! assert_eq!(ev.kind, EventKind::GraceExceeded);
//! assert_eq!(ev.resource.as_deref(), Some("jobs-%d"));
//! assert_eq!(ev.grace_ms, Some(100));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `resource`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `resource`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Shutdown trigger ===
    /// Shutdown requested (OS signal or the `run_until` trigger completed).
    ShutdownRequested,

    // === Resource sweep ===
    /// `start` is about to be called on a resource.
    ///
    /// Sets:
    /// - `resource`: resource name
    ResourceStarting,

    /// `start` returned `Ok`.
    ///
    /// Sets:
    /// - `resource`: resource name
    ResourceStarted,

    /// `start` failed; the sweep aborts.
    ///
    /// Sets:
    /// - `resource`: resource name
    /// - `reason`: error message
    ResourceStartFailed,

    /// `stop` is about to be called on a resource.
    ///
    /// Sets:
    /// - `resource`: resource name
    ResourceStopping,

    /// `stop` returned `Ok`.
    ///
    /// Sets:
    /// - `resource`: resource name
    ResourceStopped,

    /// `stop` failed; the sweep continues with the next resource.
    ///
    /// Sets:
    /// - `resource`: resource name
    /// - `reason`: error message
    ResourceStopFailed,

    // === Pool shutdown outcomes ===
    /// Pool finished all queued and in-flight jobs within its grace period.
    ///
    /// Sets:
    /// - `resource`: pool name
    /// - `grace_ms`: configured grace period
    PoolDrained,

    /// Grace period elapsed; the pool was forcibly terminated.
    ///
    /// Sets:
    /// - `resource`: pool name
    /// - `grace_ms`: configured grace period
    /// - `abandoned`: queued jobs discarded
    /// - `reason`: stuck workers, if any
    GraceExceeded,

    /// The wait for drainage was interrupted; the pool was forcibly terminated.
    ///
    /// Sets:
    /// - `resource`: pool name
    /// - `abandoned`: queued jobs discarded
    ShutdownInterrupted,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the resource (or subscriber), if applicable.
    pub resource: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Grace period in milliseconds (compact).
    pub grace_ms: Option<u32>,
    /// Number of queued jobs discarded by forced termination.
    pub abandoned: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            resource: None,
            reason: None,
            grace_ms: None,
            abandoned: None,
        }
    }

    /// Attaches a resource name.
    #[inline]
    pub fn with_resource(mut self, resource: impl Into<Arc<str>>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a grace period (stored as milliseconds).
    #[inline]
    pub fn with_grace(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.grace_ms = Some(ms);
        self
    }

    /// Attaches the number of abandoned jobs.
    #[inline]
    pub fn with_abandoned(mut self, n: usize) -> Self {
        self.abandoned = Some(n.min(u32::MAX as usize) as u32);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_resource(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_resource(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::ResourceStarting);
        let b = Event::new(EventKind::ResourceStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn grace_is_clamped_to_u32_millis() {
        let ev = Event::new(EventKind::PoolDrained).with_grace(Duration::from_secs(u64::MAX / 4));
        assert_eq!(ev.grace_ms, Some(u32::MAX));
    }
}
