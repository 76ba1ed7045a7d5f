//! # Units of work accepted by pools.
//!
//! A job is an async closure receiving a [`CancellationToken`]:
//!
//! ```text
//! FnOnce(CancellationToken) -> impl Future<Output = ()>
//!                 │
//!                 └─► cancelled when the pool is forcibly terminated
//!                     (or, for scheduled tasks, when the handle is cancelled)
//! ```
//!
//! ## Rules
//! - A job observing its token can stop cooperatively; a job that ignores it is
//!   dropped at its next `.await` once the interrupt grace elapses.
//! - A job blocking its thread cannot be dropped; its worker is reported as stuck.
//! - A panicking job is caught and logged; its worker keeps running.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::JobError;

/// One-shot job as stored in pool queues.
pub(crate) struct Job(Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, ()> + Send>);

impl Job {
    pub(crate) fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Job(Box::new(move |ctx| f(ctx).boxed()))
    }

    /// Wraps a value-producing closure; the value is delivered through the returned handle.
    pub(crate) fn with_result<F, Fut, T>(f: F) -> (Self, JobHandle<T>)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job = Job::new(move |ctx| async move {
            let _ = tx.send(f(ctx).await);
        });
        (job, JobHandle { rx })
    }

    pub(crate) fn into_future(self, ctx: CancellationToken) -> BoxFuture<'static, ()> {
        (self.0)(ctx)
    }
}

/// Repeating job body of a periodic scheduled task.
pub(crate) type RepeatingJob = Arc<dyn Fn(CancellationToken) -> BoxFuture<'static, ()> + Send + Sync>;

pub(crate) fn repeating<F, Fut>(f: F) -> RepeatingJob
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

/// How a single job run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum JobOutcome {
    Completed,
    Panicked(String),
    Interrupted,
}

/// Drives `fut` to completion unless `interrupt` fires.
///
/// Once `interrupt` is cancelled the job still gets `grace` to finish on its own before
/// it is dropped.
pub(crate) async fn run_interruptible(
    fut: BoxFuture<'static, ()>,
    interrupt: &CancellationToken,
    grace: Duration,
) -> JobOutcome {
    let fut = AssertUnwindSafe(fut).catch_unwind();
    tokio::pin!(fut);

    tokio::select! {
        biased;
        res = &mut fut => outcome(res),
        _ = interrupt.cancelled() => {
            if grace.is_zero() {
                return JobOutcome::Interrupted;
            }
            match tokio::time::timeout(grace, &mut fut).await {
                Ok(res) => outcome(res),
                Err(_) => JobOutcome::Interrupted,
            }
        }
    }
}

fn outcome(res: Result<(), Box<dyn Any + Send>>) -> JobOutcome {
    match res {
        Ok(()) => JobOutcome::Completed,
        Err(panic) => JobOutcome::Panicked(panic_message(&*panic)),
    }
}

/// Extracts the message of a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_owned()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Result of a job submitted with [`WorkerPool::submit`](crate::WorkerPool::submit).
///
/// Resolves to the job's value, or [`JobError::Abandoned`] if the job was discarded,
/// interrupted, or panicked.
#[must_use = "a JobHandle does nothing unless awaited"]
#[derive(Debug)]
pub struct JobHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future for JobHandle<T> {
    type Output = Result<T, JobError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map_err(|_| JobError::Abandoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completed_job_delivers_its_value() {
        let (job, handle) = Job::with_result(|_ctx| async { 7 });
        let out = run_interruptible(job.into_future(CancellationToken::new()), &CancellationToken::new(), Duration::ZERO).await;

        assert_eq!(out, JobOutcome::Completed);
        assert_eq!(handle.await, Ok(7));
    }

    #[tokio::test]
    async fn panic_is_caught_and_abandons_the_handle() {
        let (job, handle) = Job::with_result(|_ctx| async {
            if true {
                panic!("job blew up");
            }
            1
        });
        let out = run_interruptible(job.into_future(CancellationToken::new()), &CancellationToken::new(), Duration::ZERO).await;

        assert_eq!(out, JobOutcome::Panicked("job blew up".into()));
        assert_eq!(handle.await, Err(JobError::Abandoned));
    }

    #[tokio::test]
    async fn interrupt_drops_a_job_ignoring_its_token() {
        let interrupt = CancellationToken::new();
        let job = Job::new(|_ctx| tokio::time::sleep(Duration::from_secs(30)));
        interrupt.cancel();

        let out = run_interruptible(job.into_future(interrupt.child_token()), &interrupt, Duration::ZERO).await;
        assert_eq!(out, JobOutcome::Interrupted);
    }

    #[tokio::test]
    async fn cooperative_job_finishes_within_interrupt_grace() {
        let interrupt = CancellationToken::new();
        let job = Job::new(|ctx: CancellationToken| async move {
            ctx.cancelled().await;
            tokio::time::sleep(Duration::from_millis(10)).await;
        });
        let fut = job.into_future(interrupt.child_token());
        interrupt.cancel();

        let out = run_interruptible(fut, &interrupt, Duration::from_secs(5)).await;
        assert_eq!(out, JobOutcome::Completed);
    }
}
