//! # Scheduled pool builder.
//!
//! Defaults: thread count and shutdown period from
//! [`LifecycleConfig`](crate::LifecycleConfig), `remove_on_cancel = false`, platform thread
//! factory, no interrupt grace.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::pool_base;
use crate::core::Lifecycle;
use crate::error::ConfigError;
use crate::pools::{ScheduledPool, ThreadFactory};

/// Fluent configuration of a [`ScheduledPool`]; `build()` registers it with the lifecycle.
#[must_use = "a pool is only created and registered by build()"]
pub struct ScheduledPoolBuilder<'a> {
    lifecycle: &'a Lifecycle,
    name: String,
    threads: usize,
    remove_on_cancel: bool,
    factory: Option<Arc<dyn ThreadFactory>>,
    shutdown_period: Duration,
    interrupt_grace: Duration,
}

impl<'a> ScheduledPoolBuilder<'a> {
    pub(crate) fn new(lifecycle: &'a Lifecycle, name: impl Into<String>) -> Self {
        let cfg = lifecycle.config();
        Self {
            lifecycle,
            name: name.into(),
            threads: cfg.scheduled_threads,
            remove_on_cancel: false,
            factory: None,
            shutdown_period: cfg.shutdown_period,
            interrupt_grace: Duration::ZERO,
        }
    }

    /// Number of worker threads (started lazily, never retired while running).
    pub fn threads(mut self, n: usize) -> Self {
        self.threads = n;
        self
    }

    /// Removes cancelled tasks from the queue immediately instead of at their trigger time.
    pub fn remove_on_cancel(mut self, remove: bool) -> Self {
        self.remove_on_cancel = remove;
        self
    }

    /// Replaces the platform thread factory. It is still wrapped for instrumentation.
    pub fn thread_factory(mut self, factory: Arc<dyn ThreadFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Grace period granted to drain on `stop()`.
    pub fn shutdown_period(mut self, d: Duration) -> Self {
        self.shutdown_period = d;
        self
    }

    /// Time a running job gets to react to its cancelled token before it is dropped.
    pub fn interrupt_grace(mut self, d: Duration) -> Self {
        self.interrupt_grace = d;
        self
    }

    /// Validates the configuration, creates the pool and registers it.
    ///
    /// # Errors
    /// [`ConfigError::ZeroThreads`] when `threads == 0`. Nothing is registered on error.
    pub fn build(self) -> Result<ScheduledPool, ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }

        let base = pool_base(
            self.name,
            self.factory,
            self.lifecycle.metrics(),
            self.interrupt_grace,
        );
        let pool = ScheduledPool::new(base, self.threads, self.remove_on_cancel);
        self.lifecycle
            .register_executor(Arc::new(pool.clone()), self.shutdown_period);
        debug!(
            pool = %pool.name(),
            threads = self.threads,
            remove_on_cancel = self.remove_on_cancel,
            "scheduled pool registered"
        );
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LifecycleConfig;

    #[tokio::test]
    async fn defaults_come_from_config() {
        let cfg = LifecycleConfig {
            scheduled_threads: 3,
            ..LifecycleConfig::default()
        };
        let lc = Lifecycle::new(cfg);
        let pool = lc.scheduled_pool("cron-%d").build().unwrap();

        assert_eq!(pool.threads(), 3);
        assert!(!pool.remove_on_cancel());
        assert_eq!(lc.managed_names(), vec!["cron-%d"]);
    }

    #[tokio::test]
    async fn zero_threads_registers_nothing() {
        let lc = Lifecycle::new(LifecycleConfig::default());
        let err = lc.scheduled_pool("cron-%d").threads(0).build().unwrap_err();

        assert_eq!(err, ConfigError::ZeroThreads);
        assert!(lc.managed_names().is_empty());
    }
}
