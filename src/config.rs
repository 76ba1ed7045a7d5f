//! # Global lifecycle configuration.
//!
//! Provides [`LifecycleConfig`] centralized defaults for the lifecycle runtime.
//!
//! Config is used in two ways:
//! 1. **Lifecycle creation**: `Lifecycle::builder(config)`
//! 2. **Builder defaults**: every `worker_pool(..)` / `scheduled_pool(..)` builder starts
//!    from the shutdown period, keep-alive and thread count configured here.
//!
//! ## Sentinel values
//! - `termination_timeout = 0s` → do not wait for workers after escalation
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Global configuration for the lifecycle runtime.
///
/// ## Field semantics
/// - `shutdown_period`: Default grace period a pool gets to drain on `stop()`
/// - `termination_timeout`: Secondary bound waited after forced interruption (`0s` = no wait)
/// - `keep_alive`: Default idle time before a worker above `min_threads` retires
/// - `scheduled_threads`: Default thread count of scheduled pools
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
///
/// ## Notes
/// All fields are public. Prefer the helper accessors to avoid sprinkling sentinel
/// checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct LifecycleConfig {
    /// Default grace period for pools built through the lifecycle.
    ///
    /// On `stop()` a pool stops accepting work and gets up to this long to finish
    /// queued and in-flight jobs before it is forcibly terminated.
    pub shutdown_period: Duration,

    /// How long to wait for workers to exit after forced interruption.
    ///
    /// Jobs stuck in blocking code cannot be dropped; once this elapses the adapter
    /// reports their workers as stuck and moves on.
    pub termination_timeout: Duration,

    /// Default keep-alive for idle workers above the pool minimum.
    pub keep_alive: Duration,

    /// Default number of threads for scheduled pools.
    pub scheduled_threads: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl LifecycleConfig {
    /// Returns the post-escalation wait as an `Option`.
    ///
    /// - `None` → do not wait for workers after forced interruption
    /// - `Some(d)` → wait up to `d`
    #[inline]
    pub fn termination_wait(&self) -> Option<Duration> {
        if self.termination_timeout == Duration::ZERO {
            None
        } else {
            Some(self.termination_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for LifecycleConfig {
    /// Default configuration:
    ///
    /// - `shutdown_period = 5s`
    /// - `termination_timeout = 10s`
    /// - `keep_alive = 60s`
    /// - `scheduled_threads = 1`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            shutdown_period: Duration::from_secs(5),
            termination_timeout: Duration::from_secs(10),
            keep_alive: Duration::from_secs(60),
            scheduled_threads: 1,
            bus_capacity: 1024,
        }
    }
}
