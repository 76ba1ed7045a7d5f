//! # State and plumbing shared by every pool kind.
//!
//! Each worker is an OS thread from the pool's [`ThreadFactory`] running a
//! current-thread tokio runtime:
//!
//! ```text
//! spawn_worker(work, lost)
//!   └─► factory.new_thread("jobs-3", body)
//!         └─► body: Runtime::new_current_thread()
//!               ├─ Ok  ─► block_on(work("jobs-3"))
//!               └─ Err ─► lost("jobs-3")   (pool forgets the worker)
//! ```
//!
//! The `interrupt` token is cancelled by `shutdown_now()`; every job token is one of its
//! children. `terminated` is cancelled once the last worker of a shut-down pool exits.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::instruments::PoolInstruments;
use super::job::JobOutcome;
use super::thread_factory::{NameFormat, ThreadFactory};

pub(crate) struct PoolBase {
    pub(crate) names: NameFormat,
    pub(crate) factory: Arc<dyn ThreadFactory>,
    pub(crate) instruments: PoolInstruments,
    pub(crate) interrupt: CancellationToken,
    pub(crate) terminated: CancellationToken,
    pub(crate) interrupt_grace: Duration,
}

impl PoolBase {
    pub(crate) fn new(
        names: NameFormat,
        factory: Arc<dyn ThreadFactory>,
        instruments: PoolInstruments,
        interrupt_grace: Duration,
    ) -> Self {
        Self {
            names,
            factory,
            instruments,
            interrupt: CancellationToken::new(),
            terminated: CancellationToken::new(),
            interrupt_grace,
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.names.template()
    }

    /// Starts a worker thread; returns its name.
    ///
    /// `lost` runs instead of `work` if the thread started but its runtime could not be built.
    pub(crate) fn spawn_worker<W, Fut, L>(&self, work: W, lost: L) -> io::Result<String>
    where
        W: FnOnce(String) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()>,
        L: FnOnce(&str) + Send + 'static,
    {
        let name = self.names.next_name();
        let worker = name.clone();
        let pool = self.name().to_owned();

        self.factory.new_thread(
            name.clone(),
            Box::new(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt.block_on(work(worker)),
                    Err(err) => {
                        error!(pool = %pool, worker = %worker, error = %err, "worker runtime failed to start");
                        lost(&worker);
                    }
                }
            }),
        )?;
        Ok(name)
    }

    /// Logs how a job run ended.
    pub(crate) fn report(&self, worker: &str, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Completed => {}
            JobOutcome::Panicked(msg) => {
                warn!(pool = %self.name(), worker = %worker, panic = %msg, "job panicked");
            }
            JobOutcome::Interrupted => {
                debug!(pool = %self.name(), worker = %worker, "job interrupted");
            }
        }
    }

    pub(crate) async fn await_termination(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.terminated.cancelled())
            .await
            .is_ok()
    }
}
