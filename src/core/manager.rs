//! # Executor lifecycle adapter.
//!
//! [`ExecutorManager`] turns a pool into a [`Managed`] resource with a bounded graceful stop.
//!
//! ```text
//! stop():
//!   executor.shutdown()                     (reject new work, drain the rest)
//!   select(biased) {
//!     await_termination(shutdown_period) ─┬─ true  ─► PoolDrained, Ok(())
//!                                         └─ false ─► escalate ─► GraceExceeded,
//!                                                       Err(ShutdownTimeout)
//!     interrupt.cancelled()              ─────────► escalate ─► ShutdownInterrupted,
//!                                                       Err(ShutdownInterrupted)
//!   }
//!
//! escalate:
//!   abandoned = executor.shutdown_now()     (discard queue, interrupt running jobs)
//!   await_termination(termination_timeout) (secondary bound)
//!   stuck = executor.busy_workers()         (workers that never came back)
//! ```
//!
//! ## Rules
//! - `start()` never fails: pools are live from construction.
//! - Both escalation outcomes are recoverable errors: the pool **is** stopped, but work was
//!   abandoned, so the lifecycle reports them.
//! - The interrupt token is never reset; once cancelled, every later adapter escalates
//!   immediately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ResourceError;
use crate::events::{Bus, Event, EventKind};
use crate::pools::Executor;
use crate::resources::Managed;

/// Adapts an [`Executor`] to the [`Managed`] lifecycle.
///
/// Pool builders create one automatically; construct it directly to manage a custom
/// [`Executor`].
pub struct ExecutorManager {
    executor: Arc<dyn Executor>,
    shutdown_period: Duration,
    termination_timeout: Option<Duration>,
    interrupt: CancellationToken,
    bus: Option<Bus>,
}

impl ExecutorManager {
    /// Creates an adapter granting `executor` up to `shutdown_period` to drain.
    ///
    /// Defaults: 10s termination timeout, a private interrupt token, no event bus.
    pub fn new(executor: Arc<dyn Executor>, shutdown_period: Duration) -> Self {
        Self {
            executor,
            shutdown_period,
            termination_timeout: Some(Duration::from_secs(10)),
            interrupt: CancellationToken::new(),
            bus: None,
        }
    }

    /// Sets how long to wait for workers after forced interruption (`None` = don't wait).
    pub fn with_termination_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.termination_timeout = timeout;
        self
    }

    /// Uses `token` to cut the drain wait short.
    pub fn with_interrupt(mut self, token: CancellationToken) -> Self {
        self.interrupt = token;
        self
    }

    /// Publishes shutdown outcomes on `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Grace period granted on `stop()`.
    pub fn shutdown_period(&self) -> Duration {
        self.shutdown_period
    }

    /// The wrapped executor.
    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    fn publish(&self, event: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(event.with_resource(self.executor.name()));
        }
    }

    /// Forces termination; returns the discarded job count and the workers still stuck.
    async fn escalate(&self) -> (usize, Vec<String>) {
        let abandoned = self.executor.shutdown_now();
        if let Some(wait) = self.termination_timeout {
            self.executor.await_termination(wait).await;
        }
        let stuck = if self.executor.is_terminated() {
            Vec::new()
        } else {
            self.executor.busy_workers()
        };
        (abandoned, stuck)
    }
}

#[async_trait]
impl Managed for ExecutorManager {
    fn name(&self) -> &str {
        self.executor.name()
    }

    async fn stop(&self) -> Result<(), ResourceError> {
        let grace = self.shutdown_period;
        self.executor.shutdown();

        let drained = tokio::select! {
            biased;
            done = self.executor.await_termination(grace) => Some(done),
            _ = self.interrupt.cancelled() => None,
        };

        match drained {
            Some(true) => {
                debug!(pool = %self.executor.name(), "pool drained");
                self.publish(Event::new(EventKind::PoolDrained).with_grace(grace));
                Ok(())
            }
            Some(false) => {
                let (abandoned, stuck) = self.escalate().await;
                warn!(
                    pool = %self.executor.name(),
                    grace = ?grace,
                    abandoned,
                    stuck = ?stuck,
                    "pool did not drain within its grace period; forced termination"
                );
                let mut ev = Event::new(EventKind::GraceExceeded)
                    .with_grace(grace)
                    .with_abandoned(abandoned);
                if !stuck.is_empty() {
                    ev = ev.with_reason(format!("stuck: {}", stuck.join(", ")));
                }
                self.publish(ev);
                Err(ResourceError::ShutdownTimeout {
                    grace,
                    abandoned,
                    stuck,
                })
            }
            None => {
                let (abandoned, stuck) = self.escalate().await;
                warn!(
                    pool = %self.executor.name(),
                    abandoned,
                    stuck = ?stuck,
                    "pool shutdown interrupted; forced termination"
                );
                self.publish(Event::new(EventKind::ShutdownInterrupted).with_abandoned(abandoned));
                Err(ResourceError::ShutdownInterrupted { abandoned, stuck })
            }
        }
    }
}

impl std::fmt::Debug for ExecutorManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorManager")
            .field("pool", &self.executor.name())
            .field("shutdown_period", &self.shutdown_period)
            .field("termination_timeout", &self.termination_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::pools::PoolState;

    /// Executor double that drains only when told to.
    struct FakeExecutor {
        state: Mutex<PoolState>,
        drains: bool,
        queued: usize,
        done: CancellationToken,
    }

    impl FakeExecutor {
        fn new(drains: bool, queued: usize) -> Arc<Self> {
            Arc::new(Self {
                state: Mutex::new(PoolState::Running),
                drains,
                queued,
                done: CancellationToken::new(),
            })
        }

        fn finish(&self) {
            *self.state.lock().unwrap() = PoolState::Terminated;
            self.done.cancel();
        }
    }

    #[async_trait]
    impl Executor for FakeExecutor {
        fn name(&self) -> &str {
            "fake-%d"
        }

        fn state(&self) -> PoolState {
            *self.state.lock().unwrap()
        }

        fn shutdown(&self) {
            *self.state.lock().unwrap() = PoolState::ShuttingDown;
            if self.drains {
                self.finish();
            }
        }

        fn shutdown_now(&self) -> usize {
            self.finish();
            self.queued
        }

        fn busy_workers(&self) -> Vec<String> {
            Vec::new()
        }

        async fn await_termination(&self, timeout: Duration) -> bool {
            tokio::time::timeout(timeout, self.done.cancelled())
                .await
                .is_ok()
        }
    }

    #[tokio::test]
    async fn start_is_a_noop() {
        let exec = FakeExecutor::new(true, 0);
        let mgr = ExecutorManager::new(exec.clone(), Duration::from_secs(1));

        assert!(mgr.start().await.is_ok());
        assert!(mgr.start().await.is_ok());
        assert_eq!(exec.state(), PoolState::Running);
        assert_eq!(mgr.name(), "fake-%d");
    }

    #[tokio::test]
    async fn drained_pool_stops_cleanly() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let mgr = ExecutorManager::new(FakeExecutor::new(true, 0), Duration::from_secs(1))
            .with_bus(bus);

        assert!(mgr.stop().await.is_ok());
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::PoolDrained);
        assert_eq!(ev.resource.as_deref(), Some("fake-%d"));
    }

    #[tokio::test]
    async fn grace_exceeded_escalates() {
        let exec = FakeExecutor::new(false, 3);
        let mgr = ExecutorManager::new(exec.clone(), Duration::from_millis(50));

        match mgr.stop().await {
            Err(ResourceError::ShutdownTimeout {
                grace,
                abandoned,
                stuck,
            }) => {
                assert_eq!(grace, Duration::from_millis(50));
                assert_eq!(abandoned, 3);
                assert!(stuck.is_empty());
            }
            other => panic!("expected ShutdownTimeout, got {other:?}"),
        }
        assert!(exec.is_terminated());
    }

    #[tokio::test]
    async fn interrupt_token_cuts_the_wait_short() {
        let token = CancellationToken::new();
        let exec = FakeExecutor::new(false, 1);
        let mgr = ExecutorManager::new(exec.clone(), Duration::from_secs(30))
            .with_interrupt(token.clone());
        token.cancel();

        let started = std::time::Instant::now();
        let err = mgr.stop().await.unwrap_err();
        assert!(matches!(
            err,
            ResourceError::ShutdownInterrupted { abandoned: 1, .. }
        ));
        assert!(err.is_recoverable());
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(token.is_cancelled());
    }
}
