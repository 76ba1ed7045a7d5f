//! # The control surface a pool exposes to its lifecycle adapter.

use std::time::Duration;

use async_trait::async_trait;

/// Run state of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Accepting work.
    Running,
    /// No longer accepting work; queued and in-flight jobs are finishing.
    ShuttingDown,
    /// Every worker has exited.
    Terminated,
}

impl PoolState {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolState::Running => "running",
            PoolState::ShuttingDown => "shutting_down",
            PoolState::Terminated => "terminated",
        }
    }
}

/// A pool that can be shut down by an [`ExecutorManager`](crate::ExecutorManager).
///
/// Implemented by [`WorkerPool`](crate::WorkerPool) and [`ScheduledPool`](crate::ScheduledPool).
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    /// Display name (the thread name template).
    fn name(&self) -> &str;

    /// Current run state.
    fn state(&self) -> PoolState;

    /// Stops accepting work; queued work still runs. Idempotent.
    fn shutdown(&self);

    /// Stops accepting work, discards the queue and interrupts running jobs.
    ///
    /// Returns the number of queued jobs discarded.
    fn shutdown_now(&self) -> usize;

    /// Names of workers currently running a job.
    fn busy_workers(&self) -> Vec<String>;

    /// Waits until every worker has exited. Returns `false` if `timeout` elapsed first.
    async fn await_termination(&self, timeout: Duration) -> bool;

    /// `true` once [`shutdown`](Self::shutdown) or [`shutdown_now`](Self::shutdown_now) was called.
    fn is_shutdown(&self) -> bool {
        self.state() != PoolState::Running
    }

    /// `true` once every worker has exited after shutdown.
    fn is_terminated(&self) -> bool {
        self.state() == PoolState::Terminated
    }
}
