//! # Lifecycle: ordered startup and graceful, bounded shutdown of managed resources.
//!
//! The [`Lifecycle`] owns the resource registry, the event bus, a [`SubscriberSet`], the
//! shared metrics sink and the interrupt token handed to every pool adapter.
//!
//! ## High-level architecture
//! ```text
//! Setup:
//!   lifecycle.manage(db)                               ─► [db]
//!   lifecycle.worker_pool("jobs-%d").build()?          ─► [db, jobs-%d]
//!   lifecycle.scheduled_pool("cron-%d").build()?       ─► [db, jobs-%d, cron-%d]
//!
//! start():  db.start() ─► jobs.start() ─► cron.start()       (fail-fast)
//! stop():   cron.stop() ─► jobs.stop() ─► db.stop()          (collect-all)
//!
//! Event flow:
//!   Lifecycle / ExecutorManager ── publish(Event) ──► Bus ──► subscriber_listener
//!                                                               └─► SubscriberSet::emit
//!
//! run():
//!   start()?
//!   first signal  ─► ShutdownRequested ─► stop()
//!   second signal ─► interrupt.cancel()  (remaining pools escalate immediately)
//! ```
//!
//! ## Rules
//! - Registration order is the start order; stop order is its exact reverse.
//! - `start()` stops at the first failure; resources already started stay started.
//! - `stop()` attempts **every** resource, then reports all failures at once.
//! - Resources are stopped one at a time; worst-case shutdown is the sum of their grace
//!   periods.
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use lifevisor::{Lifecycle, LifecycleConfig, RejectionPolicy};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lifecycle = Lifecycle::new(LifecycleConfig::default());
//!
//!     let jobs = lifecycle
//!         .worker_pool("jobs-%d")
//!         .min_threads(2)
//!         .max_threads(8)
//!         .queue_capacity(Some(0))
//!         .rejection_policy(RejectionPolicy::CallerRuns)
//!         .shutdown_period(Duration::from_secs(2))
//!         .build()?;
//!
//!     jobs.execute(|_ctx| async { /* work */ }).await?;
//!
//!     lifecycle.run().await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::builders::{ScheduledPoolBuilder, WorkerPoolBuilder};
use crate::config::LifecycleConfig;
use crate::core::builder::LifecycleBuilder;
use crate::core::manager::ExecutorManager;
use crate::core::shutdown::ShutdownSignals;
use crate::error::{LifecycleError, StopFailure};
use crate::events::{Bus, Event, EventKind};
use crate::pools::Executor;
use crate::resources::ManagedRef;
use crate::subscribers::SubscriberSet;
use crate::telemetry::MetricsSink;

/// Registry of managed resources with ordered start and reverse-ordered stop.
pub struct Lifecycle {
    cfg: LifecycleConfig,
    resources: Mutex<Vec<ManagedRef>>,
    metrics: Arc<dyn MetricsSink>,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    interrupt: CancellationToken,
}

impl Lifecycle {
    /// Creates a lifecycle with no subscribers reporting into the `metrics` facade.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(cfg: LifecycleConfig) -> Self {
        LifecycleBuilder::new(cfg).build()
    }

    /// Returns a builder for subscribers and a custom metrics sink.
    pub fn builder(cfg: LifecycleConfig) -> LifecycleBuilder {
        LifecycleBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: LifecycleConfig,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let lifecycle = Self {
            cfg,
            resources: Mutex::new(Vec::new()),
            metrics,
            bus,
            subs,
            interrupt: CancellationToken::new(),
        };
        lifecycle.subscriber_listener();
        lifecycle
    }

    /// Appends a resource. Duplicates are allowed and are started/stopped once per entry.
    pub fn manage(&self, resource: ManagedRef) {
        debug!(resource = %resource.name(), "resource registered");
        self.lock().push(resource);
    }

    /// Names of the registered resources, in registration order.
    pub fn managed_names(&self) -> Vec<String> {
        self.lock().iter().map(|r| r.name().to_owned()).collect()
    }

    /// Starts configuring a worker pool; `build()` registers it here.
    ///
    /// `name` is the thread name template (`%d` is replaced by the thread index).
    pub fn worker_pool(&self, name: impl Into<String>) -> WorkerPoolBuilder<'_> {
        WorkerPoolBuilder::new(self, name)
    }

    /// Starts configuring a scheduled pool; `build()` registers it here.
    pub fn scheduled_pool(&self, name: impl Into<String>) -> ScheduledPoolBuilder<'_> {
        ScheduledPoolBuilder::new(self, name)
    }

    /// The shared metrics sink pools report into.
    pub fn metrics(&self) -> &Arc<dyn MetricsSink> {
        &self.metrics
    }

    /// The configuration builders take their defaults from.
    pub fn config(&self) -> &LifecycleConfig {
        &self.cfg
    }

    /// The token that interrupts pool adapters waiting for drainage.
    ///
    /// Cancel it to make every remaining pool escalate immediately.
    pub fn interrupt_token(&self) -> CancellationToken {
        self.interrupt.clone()
    }

    /// Receives every lifecycle event published after this call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Starts every resource in registration order.
    ///
    /// # Errors
    /// [`LifecycleError::StartupFailed`] for the first resource that fails; later
    /// resources are not started and earlier ones stay started.
    pub async fn start(&self) -> Result<(), LifecycleError> {
        for resource in self.snapshot() {
            let name = resource.name().to_owned();
            self.bus
                .publish(Event::new(EventKind::ResourceStarting).with_resource(name.as_str()));

            if let Err(source) = resource.start().await {
                error!(resource = %name, error = %source, "resource failed to start");
                self.bus.publish(
                    Event::new(EventKind::ResourceStartFailed)
                        .with_resource(name.as_str())
                        .with_reason(source.as_message()),
                );
                return Err(LifecycleError::StartupFailed {
                    resource: name,
                    source,
                });
            }
            debug!(resource = %name, "resource started");
            self.bus
                .publish(Event::new(EventKind::ResourceStarted).with_resource(name.as_str()));
        }
        Ok(())
    }

    /// Stops every resource in reverse registration order.
    ///
    /// # Errors
    /// [`LifecycleError::ShutdownFailed`] once all resources were attempted, if any failed.
    pub async fn stop(&self) -> Result<(), LifecycleError> {
        let mut failures = Vec::new();

        for resource in self.snapshot().into_iter().rev() {
            let name = resource.name().to_owned();
            self.bus
                .publish(Event::new(EventKind::ResourceStopping).with_resource(name.as_str()));

            match resource.stop().await {
                Ok(()) => {
                    debug!(resource = %name, "resource stopped");
                    self.bus
                        .publish(Event::new(EventKind::ResourceStopped).with_resource(name.as_str()));
                }
                Err(error) => {
                    warn!(resource = %name, error = %error, "resource failed to stop");
                    self.bus.publish(
                        Event::new(EventKind::ResourceStopFailed)
                            .with_resource(name.as_str())
                            .with_reason(error.as_message()),
                    );
                    failures.push(StopFailure {
                        resource: name,
                        error,
                    });
                }
            }
        }

        let mut failures = failures.into_iter();
        match failures.next() {
            None => Ok(()),
            Some(primary) => Err(LifecycleError::ShutdownFailed {
                primary,
                suppressed: failures.collect(),
            }),
        }
    }

    /// Starts everything, waits for `trigger`, then stops everything.
    ///
    /// # Errors
    /// The startup error (nothing is stopped in that case) or the aggregated stop error.
    pub async fn run_until<F>(&self, trigger: F) -> Result<(), LifecycleError>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        trigger.await;
        info!("shutdown requested");
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.stop().await
    }

    /// Starts everything, waits for a termination signal, then stops everything.
    ///
    /// A second signal during `stop()` cancels the interrupt token.
    ///
    /// # Errors
    /// [`LifecycleError::Signal`] if signal handlers cannot be installed, otherwise as
    /// [`run_until`](Self::run_until).
    pub async fn run(&self) -> Result<(), LifecycleError> {
        let mut signals = ShutdownSignals::install()?;
        self.start().await?;

        let first = signals.recv().await;
        info!(signal = %first, "shutdown requested");
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_reason(first.to_string()));

        let stop = self.stop();
        tokio::pin!(stop);
        tokio::select! {
            res = &mut stop => return res,
            second = signals.recv() => {
                warn!(signal = %second, "second signal; interrupting remaining pool shutdowns");
                self.interrupt.cancel();
            }
        }
        stop.await
    }

    /// Wraps `executor` in an [`ExecutorManager`] wired to this lifecycle and registers it.
    pub(crate) fn register_executor(
        &self,
        executor: Arc<dyn Executor>,
        shutdown_period: std::time::Duration,
    ) {
        let manager = ExecutorManager::new(executor, shutdown_period)
            .with_termination_timeout(self.cfg.termination_wait())
            .with_interrupt(self.interrupt.clone())
            .with_bus(self.bus.clone());
        self.manage(Arc::new(manager));
    }

    /// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
    fn subscriber_listener(&self) {
        if self.subs.is_empty() {
            return;
        }
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscriber listener lagged; events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ManagedRef>> {
        self.resources.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Vec<ManagedRef> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::{Duration, Instant};

    use async_trait::async_trait;

    use crate::error::{ConfigError, ResourceError, SubmitError};
    use crate::events::EventKind;
    use crate::policies::{RejectionPolicy, WorkQueue};
    use crate::resources::{Managed, ManagedFn};
    use crate::subscribers::Subscribe;
    use crate::telemetry::InMemorySink;

    type Journal = Arc<Mutex<Vec<String>>>;

    /// Resource double recording its calls; optionally fails on stop.
    struct Recorder {
        name: &'static str,
        journal: Journal,
        fail_stop: bool,
    }

    impl Recorder {
        fn arc(name: &'static str, journal: &Journal, fail_stop: bool) -> ManagedRef {
            Arc::new(Self {
                name,
                journal: journal.clone(),
                fail_stop,
            })
        }
    }

    #[async_trait]
    impl Managed for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        async fn start(&self) -> Result<(), ResourceError> {
            self.journal.lock().unwrap().push(format!("start {}", self.name));
            Ok(())
        }

        async fn stop(&self) -> Result<(), ResourceError> {
            self.journal.lock().unwrap().push(format!("stop {}", self.name));
            if self.fail_stop {
                Err(ResourceError::failed(format!("{} broke", self.name)))
            } else {
                Ok(())
            }
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
    async fn starts_in_order_and_stops_in_reverse() {
        let (lc, _) = lifecycle();
        let journal = Journal::default();
        for name in ["a", "b", "c"] {
            lc.manage(Recorder::arc(name, &journal, false));
        }

        lc.start().await.unwrap();
        lc.stop().await.unwrap();

        assert_eq!(
            *journal.lock().unwrap(),
            vec!["start a", "start b", "start c", "stop c", "stop b", "stop a"]
        );
    }

    #[tokio::test]
    async fn stop_attempts_everything_and_aggregates_failures() {
        let (lc, _) = lifecycle();
        let journal = Journal::default();
        lc.manage(Recorder::arc("a", &journal, true));
        lc.manage(Recorder::arc("b", &journal, false));
        lc.manage(Recorder::arc("c", &journal, true));

        let err = lc.stop().await.unwrap_err();

        assert_eq!(*journal.lock().unwrap(), vec!["stop c", "stop b", "stop a"]);
        let failed: Vec<_> = err
            .stop_failures()
            .iter()
            .map(|f| f.resource.clone())
            .collect();
        assert_eq!(failed, vec!["c", "a"]);
    }

    #[tokio::test]
    async fn startup_is_fail_fast_without_rollback() {
        let (lc, _) = lifecycle();
        let journal = Journal::default();
        lc.manage(Recorder::arc("a", &journal, false));
        lc.manage(
            ManagedFn::new("broken")
                .on_start(|| async { Err(ResourceError::failed("no config")) })
                .arc(),
        );
        lc.manage(Recorder::arc("c", &journal, false));

        let err = lc.start().await.unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::StartupFailed { ref resource, .. } if resource == "broken"
        ));
        assert_eq!(*journal.lock().unwrap(), vec!["start a"]);
    }

    #[tokio::test]
    async fn pools_stop_in_reverse_registration_order() {
        let (lc, _) = lifecycle();
        let mut events = lc.events();
        for name in ["a-%d", "b-%d", "c-%d"] {
            lc.worker_pool(name).build().unwrap();
        }
        assert_eq!(lc.managed_names(), vec!["a-%d", "b-%d", "c-%d"]);

        lc.start().await.unwrap();
        lc.stop().await.unwrap();

        let mut stopping = Vec::new();
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::ResourceStopping {
                stopping.push(ev.resource.as_deref().unwrap_or_default().to_owned());
            }
        }
        assert_eq!(stopping, vec!["c-%d", "b-%d", "a-%d"]);
    }

    #[tokio::test]
    async fn invalid_bounds_register_nothing() {
        let (lc, _) = lifecycle();
        let err = lc
            .worker_pool("bad-%d")
            .min_threads(4)
            .max_threads(2)
            .build()
            .unwrap_err();

        assert_eq!(err, ConfigError::InvalidThreadBounds { min: 4, max: 2 });
        assert!(lc.managed_names().is_empty());
    }

    #[tokio::test]
    async fn stop_escalates_after_grace_and_interrupts_the_job() {
        let (lc, _) = lifecycle();
        let pool = lc
            .worker_pool("slow-%d")
            .shutdown_period(Duration::from_millis(100))
            .build()
            .unwrap();

        struct Flag(Arc<AtomicBool>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let interrupted = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let (guard, done) = (Flag(interrupted.clone()), finished.clone());
        pool.execute(move |_ctx| async move {
            let _guard = guard;
            tokio::time::sleep(Duration::from_secs(5)).await;
            done.store(true, Ordering::SeqCst);
        })
        .await
        .unwrap();
        while pool.stats().busy == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let started = Instant::now();
        let err = lc.stop().await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(1));
        let failures = err.stop_failures();
        assert!(matches!(
            failures[0].error,
            ResourceError::ShutdownTimeout { ref stuck, .. } if stuck.is_empty()
        ));
        assert!(interrupted.load(Ordering::SeqCst));
        assert!(!finished.load(Ordering::SeqCst));
        assert!(pool.is_terminated());
    }

    #[tokio::test]
    async fn cancelled_interrupt_token_escalates_every_pool() {
        let (lc, _) = lifecycle();
        let pool = lc
            .worker_pool("busy-%d")
            .shutdown_period(Duration::from_secs(30))
            .build()
            .unwrap();
        pool.execute(|ctx: CancellationToken| async move { ctx.cancelled().await })
            .await
            .unwrap();
        while pool.stats().busy == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        lc.interrupt_token().cancel();
        let err = lc.stop().await.unwrap_err();
        assert!(matches!(
            err.stop_failures()[0].error,
            ResourceError::ShutdownInterrupted { .. }
        ));
    }

    #[tokio::test]
    async fn handoff_pool_rejects_only_while_the_worker_is_busy() {
        let (lc, sink) = lifecycle();
        let pool = lc
            .worker_pool("handoff-%d")
            .queue(WorkQueue::Handoff)
            .rejection_policy(RejectionPolicy::Abort)
            .build()
            .unwrap();

        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let held = gate.clone();
        pool.execute(move |_ctx| async move {
            let _ = held.acquire().await;
        })
        .await
        .unwrap();
        while pool.stats().busy == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(matches!(
            pool.execute(|_ctx| async {}).await,
            Err(SubmitError::Rejected { .. })
        ));
        assert_eq!(sink.counter("handoff.jobs.rejected"), 1);

        gate.add_permits(1);
        while pool.stats().idle == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(pool.execute(|_ctx| async {}).await.is_ok());
        lc.stop().await.unwrap();
    }

    #[tokio::test]
    async fn purge_on_cancel_shrinks_the_queue_immediately() {
        let (lc, _) = lifecycle();
        let cron = lc
            .scheduled_pool("cron-%d")
            .remove_on_cancel(true)
            .build()
            .unwrap();

        let handle = cron
            .schedule(Duration::from_secs(10), |_ctx| async {})
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cron.queue_len(), 1);

        handle.cancel();
        assert_eq!(cron.queue_len(), 0);
        lc.stop().await.unwrap();
    }

    struct Collect(tokio::sync::mpsc::UnboundedSender<(EventKind, String)>);

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, event: &Event) {
            let resource = event.resource.as_deref().unwrap_or_default().to_owned();
            let _ = self.0.send((event.kind, resource));
        }
    }

    #[tokio::test]
    async fn subscribers_see_the_sweep_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let lc = Lifecycle::builder(LifecycleConfig::default())
            .with_subscribers(vec![Arc::new(Collect(tx))])
            .build();
        lc.worker_pool("io-%d").build().unwrap();

        lc.run_until(async {}).await.unwrap();

        let mut seen = Vec::new();
        while seen.len() < 5 {
            let next = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("event in time")
                .unwrap();
            seen.push(next);
        }
        let kinds: Vec<_> = seen.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::ResourceStarting,
                EventKind::ResourceStarted,
                EventKind::ShutdownRequested,
                EventKind::ResourceStopping,
                EventKind::PoolDrained,
            ]
        );
        assert_eq!(seen[0].1, "io-%d");
    }
}
