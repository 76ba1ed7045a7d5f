//! # Worker pool builder.
//!
//! Defaults: `min_threads = 1`, `max_threads = 1`, keep-alive and shutdown period from
//! [`LifecycleConfig`](crate::LifecycleConfig), unbounded queue, `CallerRuns`,
//! platform thread factory, no interrupt grace.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::pool_base;
use crate::core::Lifecycle;
use crate::error::ConfigError;
use crate::policies::{RejectionPolicy, WorkQueue};
use crate::pools::{ThreadFactory, WorkerPool, WorkerPoolSettings};

/// Fluent configuration of a [`WorkerPool`]; `build()` registers it with the lifecycle.
#[must_use = "a pool is only created and registered by build()"]
pub struct WorkerPoolBuilder<'a> {
    lifecycle: &'a Lifecycle,
    name: String,
    min_threads: usize,
    max_threads: usize,
    keep_alive: Duration,
    allow_core_thread_timeout: bool,
    queue: WorkQueue,
    rejection: RejectionPolicy,
    factory: Option<Arc<dyn ThreadFactory>>,
    shutdown_period: Duration,
    interrupt_grace: Duration,
}

impl<'a> WorkerPoolBuilder<'a> {
    pub(crate) fn new(lifecycle: &'a Lifecycle, name: impl Into<String>) -> Self {
        let cfg = lifecycle.config();
        Self {
            lifecycle,
            name: name.into(),
            min_threads: 1,
            max_threads: 1,
            keep_alive: cfg.keep_alive,
            allow_core_thread_timeout: false,
            queue: WorkQueue::default(),
            rejection: RejectionPolicy::default(),
            factory: None,
            shutdown_period: cfg.shutdown_period,
            interrupt_grace: Duration::ZERO,
        }
    }

    /// Threads kept alive even when idle.
    pub fn min_threads(mut self, n: usize) -> Self {
        self.min_threads = n;
        self
    }

    /// Upper bound on threads; extra threads are only started when the queue refuses a job.
    pub fn max_threads(mut self, n: usize) -> Self {
        self.max_threads = n;
        self
    }

    /// Idle time after which a thread above `min_threads` retires.
    pub fn keep_alive(mut self, d: Duration) -> Self {
        self.keep_alive = d;
        self
    }

    /// Lets threads below `min_threads` retire after `keep_alive` too.
    pub fn allow_core_thread_timeout(mut self, allow: bool) -> Self {
        self.allow_core_thread_timeout = allow;
        self
    }

    /// Queue discipline.
    pub fn queue(mut self, queue: WorkQueue) -> Self {
        self.queue = queue;
        self
    }

    /// Queue capacity: `None` unbounded, `Some(0)` hand-off, `Some(n)` bounded.
    pub fn queue_capacity(mut self, capacity: Option<usize>) -> Self {
        self.queue = WorkQueue::with_capacity(capacity);
        self
    }

    /// Behavior when no thread and no queue slot is free.
    pub fn rejection_policy(mut self, policy: RejectionPolicy) -> Self {
        self.rejection = policy;
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
    /// - [`ConfigError::ZeroMaxThreads`] when `max_threads == 0`
    /// - [`ConfigError::InvalidThreadBounds`] when `min_threads > max_threads`
    ///
    /// Nothing is registered on error.
    pub fn build(self) -> Result<WorkerPool, ConfigError> {
        if self.max_threads == 0 {
            return Err(ConfigError::ZeroMaxThreads);
        }
        if self.min_threads > self.max_threads {
            return Err(ConfigError::InvalidThreadBounds {
                min: self.min_threads,
                max: self.max_threads,
            });
        }
        if self.queue.is_unbounded() && self.min_threads < self.max_threads {
            warn!(
                pool = %self.name,
                min_threads = self.min_threads,
                max_threads = self.max_threads,
                "unbounded queue: pool will never grow past min_threads"
            );
        }

        let base = pool_base(
            self.name,
            self.factory,
            self.lifecycle.metrics(),
            self.interrupt_grace,
        );
        let pool = WorkerPool::new(
            base,
            WorkerPoolSettings {
                min_threads: self.min_threads,
                max_threads: self.max_threads,
                keep_alive: self.keep_alive,
                allow_core_thread_timeout: self.allow_core_thread_timeout,
                queue: self.queue,
                rejection: self.rejection,
            },
        );
        self.lifecycle
            .register_executor(Arc::new(pool.clone()), self.shutdown_period);
        debug!(
            pool = %pool.name(),
            min_threads = self.min_threads,
            max_threads = self.max_threads,
            queue = ?self.queue,
            rejection = self.rejection.as_label(),
            "worker pool registered"
        );
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;
    use crate::config::LifecycleConfig;
    use crate::pools::{DefaultThreadFactory, ThreadBody};
    use crate::telemetry::InMemorySink;

    struct Counting {
        spawned: AtomicUsize,
    }

    impl ThreadFactory for Counting {
        fn new_thread(&self, name: String, body: ThreadBody) -> io::Result<thread::JoinHandle<()>> {
            self.spawned.fetch_add(1, Ordering::SeqCst);
            DefaultThreadFactory::new().new_thread(name, body)
        }
    }

    fn lifecycle() -> (Lifecycle, Arc<InMemorySink>) {
        let sink = Arc::new(InMemorySink::new());
        let lc = Lifecycle::builder(LifecycleConfig::default())
            .with_metrics(sink.clone())
            .build();
        (lc, sink)
    }

    #[tokio::test]
    async fn thread_names_follow_the_template() {
        let (lc, _) = lifecycle();
        let pool = lc
            .worker_pool("render-%d-worker")
            .min_threads(2)
            .max_threads(2)
            .build()
            .unwrap();

        let mut names = Vec::new();
        for _ in 0..2 {
            let handle = pool
                .submit(|_ctx| async {
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    thread::current().name().map(str::to_owned)
                })
                .await
                .unwrap();
            names.push(handle);
        }
        let mut seen = Vec::new();
        for handle in names {
            seen.push(handle.await.unwrap().unwrap());
        }
        seen.sort();
        assert_eq!(seen, vec!["render-0-worker", "render-1-worker"]);
    }

    #[tokio::test]
    async fn custom_factory_is_used_and_instrumented() {
        let (lc, sink) = lifecycle();
        let factory = Arc::new(Counting {
            spawned: AtomicUsize::new(0),
        });
        let pool = lc
            .worker_pool("custom-%d")
            .thread_factory(factory.clone())
            .build()
            .unwrap();

        pool.submit(|_ctx| async {}).await.unwrap().await.unwrap();
        assert_eq!(factory.spawned.load(Ordering::SeqCst), 1);
        assert_eq!(sink.counter("custom.threads.created"), 1);
        assert_eq!(sink.counter("custom.jobs.completed"), 1);
    }

    #[tokio::test]
    async fn zero_max_threads_is_rejected() {
        let (lc, _) = lifecycle();
        let err = lc
            .worker_pool("none-%d")
            .min_threads(0)
            .max_threads(0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroMaxThreads);
        assert!(lc.managed_names().is_empty());
    }

    #[tokio::test]
    async fn valid_bounds_register_one_adapter() {
        let (lc, _) = lifecycle();
        for (min, max) in [(0, 1), (1, 1), (2, 8)] {
            lc.worker_pool(format!("ok-{min}-{max}-%d"))
                .min_threads(min)
                .max_threads(max)
                .queue_capacity(Some(4))
                .build()
                .unwrap();
        }
        assert_eq!(lc.managed_names().len(), 3);
    }
}
