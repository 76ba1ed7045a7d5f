//! # Thread pool for delayed and periodic jobs.
//!
//! [`ScheduledPool`] keeps a time-ordered queue of tasks served by a fixed number of
//! named worker threads (started lazily on first use).
//!
//! ```text
//! schedule(delay, job)                  ──► Once      at now + delay
//! schedule_at_fixed_rate(init, p, job)  ──► FixedRate at now + init, then start + k·p
//! schedule_with_fixed_delay(init, d, job) ► FixedDelay at now + init, then end + d
//!
//! worker loop:
//!   peek head ─┬─ due      ─► pop, run, re-queue if periodic
//!              ├─ not due  ─► sleep until due (or until an earlier task arrives)
//!              └─ empty    ─► wait for a task (exit if shut down)
//! ```
//!
//! ## Rules
//! - A periodic run never overlaps itself; a fixed-rate run that finishes late makes the
//!   next run due immediately and counts a `scheduled.overrun`.
//! - A periodic task that panics or is interrupted is not run again.
//! - Cancelling a handle removes the task from the queue right away only with
//!   `remove_on_cancel`; otherwise the entry stays until its trigger time and is then
//!   discarded.
//! - `shutdown()` drops periodic tasks; one-shot delayed tasks still run at their time.

use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::base::PoolBase;
use super::executor::{Executor, PoolState};
use super::job::{Job, JobOutcome, RepeatingJob, repeating, run_interruptible};
use crate::error::SubmitError;

/// Handle to a thread pool for delayed and periodic jobs.
///
/// Cheap to clone. Built through [`Lifecycle::scheduled_pool`](crate::Lifecycle::scheduled_pool),
/// which registers it for shutdown.
#[derive(Clone)]
pub struct ScheduledPool {
    shared: Arc<Shared>,
}

struct Shared {
    base: PoolBase,
    threads: usize,
    remove_on_cancel: bool,
    state: Mutex<State>,
    wake: Notify,
}

struct State {
    phase: PoolState,
    queue: BinaryHeap<Entry>,
    workers: usize,
    busy: BTreeSet<String>,
    next_seq: u64,
}

impl State {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

#[derive(Clone, Copy)]
enum Period {
    FixedRate(Duration),
    FixedDelay(Duration),
}

enum Work {
    Once(Job),
    Repeat(RepeatingJob, Period),
}

/// Shared between a queued entry and the caller's [`ScheduledHandle`].
struct TaskState {
    token: CancellationToken,
    finished: AtomicBool,
}

struct Entry {
    at: Instant,
    seq: u64,
    task: Arc<TaskState>,
    work: Work,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    /// Reversed: the earliest trigger time (then the earliest submission) is the heap top.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Cancellation handle of a scheduled task.
#[derive(Clone)]
pub struct ScheduledHandle {
    task: Arc<TaskState>,
    pool: Weak<Shared>,
}

impl ScheduledHandle {
    /// Cancels the task: it will not run again and a running job sees its token cancelled.
    ///
    /// Returns `false` if the task was already cancelled or a one-shot task already ran.
    pub fn cancel(&self) -> bool {
        if self.task.finished.load(AtomicOrdering::Acquire) || self.task.token.is_cancelled() {
            return false;
        }
        self.task.token.cancel();
        if let Some(pool) = self.pool.upgrade() {
            pool.purge(&self.task);
        }
        true
    }

    /// `true` once the task was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.task.token.is_cancelled()
    }

    /// `true` once a one-shot task ran (or a periodic task stopped for good).
    pub fn is_done(&self) -> bool {
        self.task.finished.load(AtomicOrdering::Acquire) || self.task.token.is_cancelled()
    }
}

impl std::fmt::Debug for ScheduledHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledHandle")
            .field("cancelled", &self.is_cancelled())
            .field("done", &self.is_done())
            .finish()
    }
}

impl ScheduledPool {
    pub(crate) fn new(base: PoolBase, threads: usize, remove_on_cancel: bool) -> Self {
        Self {
            shared: Arc::new(Shared {
                base,
                threads,
                remove_on_cancel,
                state: Mutex::new(State {
                    phase: PoolState::Running,
                    queue: BinaryHeap::new(),
                    workers: 0,
                    busy: BTreeSet::new(),
                    next_seq: 0,
                }),
                wake: Notify::new(),
            }),
        }
    }

    /// Runs `f` as soon as a worker is free.
    ///
    /// # Errors
    /// [`SubmitError::ShutDown`] after shutdown, [`SubmitError::SpawnFailed`] if no worker
    /// could be started.
    pub fn execute<F, Fut>(&self, f: F) -> Result<ScheduledHandle, SubmitError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.schedule(Duration::ZERO, f)
    }

    /// Runs `f` once after `delay`.
    ///
    /// # Errors
    /// Same as [`execute`](Self::execute).
    pub fn schedule<F, Fut>(&self, delay: Duration, f: F) -> Result<ScheduledHandle, SubmitError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.enqueue(delay, Work::Once(Job::new(f)))
    }

    /// Runs `f` after `initial_delay`, then every `period` measured from each run's start.
    ///
    /// # Errors
    /// [`SubmitError::InvalidPeriod`] for a zero `period`, otherwise as [`execute`](Self::execute).
    pub fn schedule_at_fixed_rate<F, Fut>(
        &self,
        initial_delay: Duration,
        period: Duration,
        f: F,
    ) -> Result<ScheduledHandle, SubmitError>
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.enqueue_periodic(initial_delay, Period::FixedRate(period), repeating(f))
    }

    /// Runs `f` after `initial_delay`, then again `delay` after each run ends.
    ///
    /// # Errors
    /// [`SubmitError::InvalidPeriod`] for a zero `delay`, otherwise as [`execute`](Self::execute).
    pub fn schedule_with_fixed_delay<F, Fut>(
        &self,
        initial_delay: Duration,
        delay: Duration,
        f: F,
    ) -> Result<ScheduledHandle, SubmitError>
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.enqueue_periodic(initial_delay, Period::FixedDelay(delay), repeating(f))
    }

    /// Display name (the thread name template).
    pub fn name(&self) -> &str {
        self.shared.base.name()
    }

    /// Number of queued entries (cancelled entries included until purged).
    pub fn queue_len(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Configured number of worker threads.
    pub fn threads(&self) -> usize {
        self.shared.threads
    }

    /// Whether cancelled tasks leave the queue immediately.
    pub fn remove_on_cancel(&self) -> bool {
        self.shared.remove_on_cancel
    }

    fn enqueue_periodic(
        &self,
        initial_delay: Duration,
        period: Period,
        job: RepeatingJob,
    ) -> Result<ScheduledHandle, SubmitError> {
        let (Period::FixedRate(p) | Period::FixedDelay(p)) = period;
        if p.is_zero() {
            self.shared.base.instruments.rejected();
            return Err(SubmitError::InvalidPeriod {
                pool: self.shared.base.name().to_owned(),
            });
        }
        self.enqueue(initial_delay, Work::Repeat(job, period))
    }

    fn enqueue(&self, delay: Duration, work: Work) -> Result<ScheduledHandle, SubmitError> {
        let sh = &self.shared;
        sh.base.instruments.submitted();
        let task = Arc::new(TaskState {
            token: sh.base.interrupt.child_token(),
            finished: AtomicBool::new(false),
        });

        let mut st = sh.lock();
        if st.phase != PoolState::Running {
            sh.base.instruments.rejected();
            return Err(SubmitError::ShutDown {
                pool: sh.base.name().to_owned(),
            });
        }
        let seq = st.next_seq();
        st.queue.push(Entry {
            at: deadline_after(Instant::now(), delay),
            seq,
            task: Arc::clone(&task),
            work,
        });
        sh.base.instruments.queue_depth(st.queue.len());

        if st.workers < sh.threads {
            if let Err(err) = sh.start_worker(&mut st) {
                if st.workers == 0 {
                    st.queue.retain(|e| !Arc::ptr_eq(&e.task, &task));
                    sh.base.instruments.queue_depth(st.queue.len());
                    return Err(err);
                }
            }
        }
        drop(st);
        sh.wake.notify_waiters();

        Ok(ScheduledHandle {
            task,
            pool: Arc::downgrade(&self.shared),
        })
    }
}

/// Roughly 30 years; stands in for deadlines past what `Instant` can represent.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `from + delay`, saturating at a far-future instant instead of overflowing.
fn deadline_after(from: Instant, delay: Duration) -> Instant {
    from.checked_add(delay)
        .or_else(|| from.checked_add(FAR_FUTURE))
        .unwrap_or(from)
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn purge(&self, task: &Arc<TaskState>) {
        if !self.remove_on_cancel {
            return;
        }
        let mut st = self.lock();
        st.queue.retain(|e| !Arc::ptr_eq(&e.task, task));
        self.base.instruments.queue_depth(st.queue.len());
    }

    fn start_worker(self: &Arc<Self>, st: &mut State) -> Result<(), SubmitError> {
        st.workers += 1;
        let me = Arc::clone(self);
        let lost = Arc::clone(self);

        match self
            .base
            .spawn_worker(move |name| me.work(name), move |name| lost.worker_lost(name))
        {
            Ok(name) => {
                debug!(pool = %self.base.name(), worker = %name, "scheduler worker started");
                Ok(())
            }
            Err(err) => {
                st.workers -= 1;
                warn!(pool = %self.base.name(), error = %err, "failed to spawn scheduler worker");
                Err(SubmitError::SpawnFailed {
                    pool: self.base.name().to_owned(),
                    error: err.to_string(),
                })
            }
        }
    }

    async fn work(self: Arc<Self>, name: String) {
        while let Some(entry) = self.next_due().await {
            self.run_entry(&name, entry).await;
        }
        debug!(pool = %self.base.name(), worker = %name, "scheduler worker exited");
    }

    /// Waits for the earliest entry to come due; `None` means this worker retired.
    async fn next_due(&self) -> Option<Entry> {
        loop {
            let notified = self.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let wait = {
                let mut st = self.lock();
                let now = Instant::now();
                match st.queue.peek().map(|head| head.at) {
                    None if st.phase != PoolState::Running => {
                        self.retire(&mut st);
                        return None;
                    }
                    None => None,
                    Some(at) if at <= now => {
                        let Some(entry) = st.queue.pop() else {
                            continue;
                        };
                        self.base.instruments.queue_depth(st.queue.len());
                        if entry.task.token.is_cancelled() {
                            continue;
                        }
                        return Some(entry);
                    }
                    Some(at) => Some(at - now),
                }
            };

            match wait {
                Some(until_due) => {
                    let _ = tokio::time::timeout(until_due, notified.as_mut()).await;
                }
                None => notified.as_mut().await,
            }
        }
    }

    async fn run_entry(&self, worker: &str, entry: Entry) {
        let Entry { at, task, work, .. } = entry;
        self.lock().busy.insert(worker.to_owned());
        let started = Instant::now();
        self.base.instruments.job_started();

        let next = match work {
            Work::Once(job) => {
                let outcome = self.run(job.into_future(task.token.clone())).await;
                self.base.report(worker, &outcome);
                task.finished.store(true, AtomicOrdering::Release);
                None
            }
            Work::Repeat(job, period) => {
                let outcome = self.run(job(task.token.clone())).await;
                self.base.report(worker, &outcome);
                if outcome == JobOutcome::Completed {
                    Some((job, period))
                } else {
                    task.finished.store(true, AtomicOrdering::Release);
                    None
                }
            }
        };

        self.base.instruments.job_finished(started.elapsed());
        self.lock().busy.remove(worker);

        if let Some((job, period)) = next {
            self.requeue(at, task, job, period);
        }
    }

    async fn run(&self, fut: futures::future::BoxFuture<'static, ()>) -> JobOutcome {
        run_interruptible(fut, &self.base.interrupt, self.base.interrupt_grace).await
    }

    fn requeue(&self, last_due: Instant, task: Arc<TaskState>, job: RepeatingJob, period: Period) {
        if task.token.is_cancelled() {
            return;
        }
        let now = Instant::now();
        let at = match period {
            Period::FixedRate(p) => {
                let at = deadline_after(last_due, p);
                if at < now {
                    self.base.instruments.overrun();
                }
                at
            }
            Period::FixedDelay(d) => deadline_after(now, d),
        };

        let mut st = self.lock();
        if st.phase != PoolState::Running {
            task.finished.store(true, AtomicOrdering::Release);
            return;
        }
        let seq = st.next_seq();
        st.queue.push(Entry {
            at,
            seq,
            task,
            work: Work::Repeat(job, period),
        });
        self.base.instruments.queue_depth(st.queue.len());
        drop(st);
        self.wake.notify_waiters();
    }

    fn retire(&self, st: &mut State) {
        st.workers -= 1;
        if st.phase == PoolState::ShuttingDown && st.workers == 0 {
            st.phase = PoolState::Terminated;
            self.base.terminated.cancel();
            debug!(pool = %self.base.name(), "pool terminated");
        }
    }

    fn worker_lost(&self, name: &str) {
        let mut st = self.lock();
        st.busy.remove(name);
        self.retire(&mut st);
    }

    fn begin_shutdown(&self, st: &mut State) {
        if st.phase == PoolState::Running {
            st.phase = PoolState::ShuttingDown;
            debug!(pool = %self.base.name(), queued = st.queue.len(), "pool shutting down");
        }
        if st.workers == 0 && st.phase == PoolState::ShuttingDown {
            st.phase = PoolState::Terminated;
            self.base.terminated.cancel();
        }
    }
}

#[async_trait]
impl Executor for ScheduledPool {
    fn name(&self) -> &str {
        self.shared.base.name()
    }

    fn state(&self) -> PoolState {
        self.shared.lock().phase
    }

    fn shutdown(&self) {
        let mut st = self.shared.lock();
        st.queue
            .retain(|e| matches!(e.work, Work::Once(_)) && !e.task.token.is_cancelled());
        self.shared.base.instruments.queue_depth(st.queue.len());
        self.shared.begin_shutdown(&mut st);
        drop(st);
        self.shared.wake.notify_waiters();
    }

    fn shutdown_now(&self) -> usize {
        let discarded = {
            let mut st = self.shared.lock();
            self.shared.begin_shutdown(&mut st);
            let discarded = std::mem::take(&mut st.queue);
            self.shared.base.instruments.queue_depth(0);
            discarded
        };
        let abandoned = discarded
            .iter()
            .filter(|e| !e.task.token.is_cancelled())
            .count();
        drop(discarded);

        self.shared.base.interrupt.cancel();
        self.shared.wake.notify_waiters();
        abandoned
    }

    fn busy_workers(&self) -> Vec<String> {
        self.shared.lock().busy.iter().cloned().collect()
    }

    async fn await_termination(&self, timeout: Duration) -> bool {
        self.shared.base.await_termination(timeout).await
    }
}

impl std::fmt::Debug for ScheduledPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledPool")
            .field("name", &self.shared.base.name())
            .field("threads", &self.shared.threads)
            .field("queued", &self.queue_len())
            .finish()
    }
}
