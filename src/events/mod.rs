//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the lifecycle sweep, pool adapters
//! and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Lifecycle` (start/stop sweep), `ExecutorManager` (pool shutdown
//!   outcome), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `Lifecycle::subscriber_listener()` which fans out to `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
