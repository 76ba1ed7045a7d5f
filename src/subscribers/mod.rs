//! # Event subscribers for the lifecycle runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! built-in implementations for handling events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Lifecycle / ExecutorManager ── publish(Event) ──► Bus ──► subscriber_listener
//!                                                              │
//!                                                              ▼
//!                                                        SubscriberSet::emit(&Event)
//!                                                         ┌────┴────┬─────────┐
//!                                                         ▼         ▼         ▼
//!                                                     LogWriter   Alerts    Custom
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
