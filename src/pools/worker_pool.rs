//! # Thread pool for one-shot jobs.
//!
//! [`WorkerPool`] runs submitted jobs on between `min_threads` and `max_threads` named
//! OS threads. Submission follows a fixed order:
//!
//! ```text
//! execute(job)
//!   ├─ pool not running          ─► Err(ShutDown)
//!   ├─ workers < min_threads      ─► new worker runs job
//!   ├─ queue accepts              ─► enqueue, wake one idle worker
//!   ├─ workers < max_threads      ─► new worker runs job
//!   └─ saturated                  ─► RejectionPolicy
//!        ├─ CallerRuns    ─► job runs in the submitting task
//!        ├─ Block         ─► wait for a free slot, then retry
//!        ├─ Discard       ─► job dropped
//!        ├─ DiscardOldest ─► oldest queued job dropped, job enqueued
//!        └─ Abort         ─► Err(Rejected)
//! ```
//!
//! ## Rules
//! - With an unbounded queue the pool never grows past `min_threads`.
//! - Workers above `min_threads` retire after `keep_alive` idle (all workers do with
//!   `allow_core_thread_timeout`).
//! - After `shutdown()` queued jobs still run; after `shutdown_now()` they are discarded
//!   and running jobs are interrupted.
//! - The pool is terminated when its last worker exits after shutdown.

use std::collections::{BTreeSet, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::base::PoolBase;
use super::executor::{Executor, PoolState};
use super::job::{Job, JobHandle, run_interruptible};
use crate::error::SubmitError;
use crate::policies::{RejectionPolicy, WorkQueue};

/// Sizing and saturation behavior of a [`WorkerPool`].
#[derive(Debug, Clone)]
pub(crate) struct WorkerPoolSettings {
    pub(crate) min_threads: usize,
    pub(crate) max_threads: usize,
    pub(crate) keep_alive: Duration,
    pub(crate) allow_core_thread_timeout: bool,
    pub(crate) queue: WorkQueue,
    pub(crate) rejection: RejectionPolicy,
}

/// Point-in-time view of a pool's occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Live workers.
    pub workers: usize,
    /// Workers waiting for a job.
    pub idle: usize,
    /// Workers running a job.
    pub busy: usize,
    /// Jobs running in submitting tasks under `CallerRuns`.
    pub caller_runs: usize,
    /// Jobs waiting in the queue.
    pub queued: usize,
    /// Run state.
    pub state: PoolState,
}

/// Handle to a thread pool for one-shot jobs.
///
/// Cheap to clone. Built through [`Lifecycle::worker_pool`](crate::Lifecycle::worker_pool),
/// which registers it for shutdown.
#[derive(Clone)]
pub struct WorkerPool {
    shared: Arc<Shared>,
}

struct Shared {
    base: PoolBase,
    settings: WorkerPoolSettings,
    state: Mutex<State>,
    job_ready: Notify,
    space_ready: Notify,
}

struct State {
    phase: PoolState,
    jobs: VecDeque<Job>,
    workers: usize,
    idle: usize,
    busy: BTreeSet<String>,
    caller_runs: usize,
}

enum Offer {
    Accepted,
    Saturated(Job),
}

/// Releases a caller-run slot even when the submitting future is dropped.
struct CallerRun<'a>(&'a Shared);

impl Drop for CallerRun<'_> {
    fn drop(&mut self) {
        self.0.lock().caller_runs -= 1;
    }
}

impl WorkerPool {
    pub(crate) fn new(base: PoolBase, settings: WorkerPoolSettings) -> Self {
        Self {
            shared: Arc::new(Shared {
                base,
                settings,
                state: Mutex::new(State {
                    phase: PoolState::Running,
                    jobs: VecDeque::new(),
                    workers: 0,
                    idle: 0,
                    busy: BTreeSet::new(),
                    caller_runs: 0,
                }),
                job_ready: Notify::new(),
                space_ready: Notify::new(),
            }),
        }
    }

    /// Submits a job.
    ///
    /// Resolves once the job is accepted (or, under `CallerRuns`, once it ran).
    ///
    /// # Errors
    /// - [`SubmitError::ShutDown`] after shutdown
    /// - [`SubmitError::Rejected`] when saturated under `RejectionPolicy::Abort`
    /// - [`SubmitError::SpawnFailed`] when a needed worker thread could not be created
    pub async fn execute<F, Fut>(&self, f: F) -> Result<(), SubmitError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.dispatch(Job::new(f)).await
    }

    /// Submits a job producing a value; await the returned [`JobHandle`] for it.
    ///
    /// # Errors
    /// Same as [`execute`](Self::execute).
    pub async fn submit<F, Fut, T>(&self, f: F) -> Result<JobHandle<T>, SubmitError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (job, handle) = Job::with_result(f);
        self.dispatch(job).await?;
        Ok(handle)
    }

    /// Display name (the thread name template).
    pub fn name(&self) -> &str {
        self.shared.base.name()
    }

    /// Returns current occupancy.
    pub fn stats(&self) -> PoolStats {
        let st = self.shared.lock();
        PoolStats {
            workers: st.workers,
            idle: st.idle,
            busy: st.busy.len(),
            caller_runs: st.caller_runs,
            queued: st.jobs.len(),
            state: st.phase,
        }
    }

    /// Configured minimum number of threads.
    pub fn min_threads(&self) -> usize {
        self.shared.settings.min_threads
    }

    /// Configured maximum number of threads.
    pub fn max_threads(&self) -> usize {
        self.shared.settings.max_threads
    }

    /// Configured saturation policy.
    pub fn rejection_policy(&self) -> RejectionPolicy {
        self.shared.settings.rejection
    }

    async fn dispatch(&self, job: Job) -> Result<(), SubmitError> {
        let sh = &self.shared;
        sh.base.instruments.submitted();

        let job = match sh.offer(job)? {
            Offer::Accepted => return Ok(()),
            Offer::Saturated(job) => job,
        };

        match sh.settings.rejection {
            RejectionPolicy::Abort => {
                sh.base.instruments.rejected();
                Err(SubmitError::Rejected {
                    pool: sh.base.name().to_owned(),
                })
            }
            RejectionPolicy::Discard => {
                sh.base.instruments.rejected();
                debug!(pool = %sh.base.name(), "saturated; job discarded");
                Ok(())
            }
            RejectionPolicy::DiscardOldest => sh.replace_oldest(job),
            RejectionPolicy::CallerRuns => {
                sh.base.instruments.rejected();
                sh.run_in_caller(job).await;
                Ok(())
            }
            RejectionPolicy::Block => {
                sh.base.instruments.rejected();
                sh.offer_blocking(job).await
            }
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn shut_down(&self) -> SubmitError {
        self.base.instruments.rejected();
        SubmitError::ShutDown {
            pool: self.base.name().to_owned(),
        }
    }

    fn offer(self: &Arc<Self>, job: Job) -> Result<Offer, SubmitError> {
        let mut st = self.lock();
        self.offer_locked(&mut st, job)
    }

    fn offer_locked(self: &Arc<Self>, st: &mut State, job: Job) -> Result<Offer, SubmitError> {
        if st.phase != PoolState::Running {
            return Err(self.shut_down());
        }
        if st.workers < self.settings.min_threads {
            self.start_worker(st, Some(job))?;
            return Ok(Offer::Accepted);
        }
        if self.settings.queue.accepts(st.jobs.len(), st.idle) {
            st.jobs.push_back(job);
            // With min_threads = 0 someone still has to serve the queue.
            if st.workers == 0 {
                if let Err(err) = self.start_worker(st, None) {
                    st.jobs.pop_back();
                    return Err(err);
                }
            }
            self.base.instruments.queue_depth(st.jobs.len());
            self.job_ready.notify_one();
            return Ok(Offer::Accepted);
        }
        if st.workers < self.settings.max_threads {
            self.start_worker(st, Some(job))?;
            return Ok(Offer::Accepted);
        }
        Ok(Offer::Saturated(job))
    }

    async fn offer_blocking(self: &Arc<Self>, mut job: Job) -> Result<(), SubmitError> {
        loop {
            let notified = self.space_ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.offer(job)? {
                Offer::Accepted => return Ok(()),
                Offer::Saturated(back) => job = back,
            }
            notified.await;
        }
    }

    /// Evicts the oldest queued job for `job`, unless room opened up since the offer.
    fn replace_oldest(self: &Arc<Self>, job: Job) -> Result<(), SubmitError> {
        let mut st = self.lock();
        let job = match self.offer_locked(&mut st, job)? {
            Offer::Accepted => return Ok(()),
            Offer::Saturated(job) => job,
        };
        self.base.instruments.rejected();
        if st.jobs.pop_front().is_none() {
            debug!(pool = %self.base.name(), "saturated with nothing queued; job discarded");
            return Ok(());
        }
        st.jobs.push_back(job);
        drop(st);
        self.job_ready.notify_one();
        Ok(())
    }

    fn start_worker(self: &Arc<Self>, st: &mut State, first: Option<Job>) -> Result<(), SubmitError> {
        st.workers += 1;
        let me = Arc::clone(self);
        let lost = Arc::clone(self);

        match self.base.spawn_worker(
            move |name| me.work(name, first),
            move |name| lost.worker_lost(name),
        ) {
            Ok(name) => {
                debug!(pool = %self.base.name(), worker = %name, workers = st.workers, "worker started");
                Ok(())
            }
            Err(err) => {
                st.workers -= 1;
                warn!(pool = %self.base.name(), error = %err, "failed to spawn worker");
                Err(SubmitError::SpawnFailed {
                    pool: self.base.name().to_owned(),
                    error: err.to_string(),
                })
            }
        }
    }

    async fn work(self: Arc<Self>, name: String, first: Option<Job>) {
        let mut next = first;
        loop {
            let job = match next.take() {
                Some(job) => job,
                None => match self.next_job().await {
                    Some(job) => job,
                    None => break,
                },
            };
            self.run_job(&name, job).await;
        }
        debug!(pool = %self.base.name(), worker = %name, "worker exited");
    }

    async fn run_job(&self, worker: &str, job: Job) {
        self.lock().busy.insert(worker.to_owned());
        self.execute_job(worker, job).await;
        self.lock().busy.remove(worker);
    }

    /// Runs a saturated job in the submitting task; it never counts as a busy worker.
    async fn run_in_caller(&self, job: Job) {
        self.lock().caller_runs += 1;
        let _running = CallerRun(self);
        self.execute_job("caller", job).await;
    }

    async fn execute_job(&self, label: &str, job: Job) {
        let started = Instant::now();
        self.base.instruments.job_started();

        let fut = job.into_future(self.base.interrupt.child_token());
        let outcome = run_interruptible(fut, &self.base.interrupt, self.base.interrupt_grace).await;

        self.base.instruments.job_finished(started.elapsed());
        self.base.report(label, &outcome);
    }

    /// Waits for the next queued job; `None` means this worker retired.
    async fn next_job(&self) -> Option<Job> {
        loop {
            let notified = self.job_ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let may_retire = {
                let mut st = self.lock();
                if let Some(job) = st.jobs.pop_front() {
                    self.base.instruments.queue_depth(st.jobs.len());
                    drop(st);
                    self.space_ready.notify_waiters();
                    return Some(job);
                }
                if st.phase != PoolState::Running {
                    self.retire(&mut st);
                    return None;
                }
                st.idle += 1;
                self.may_retire(&st)
            };
            // An idle worker opens a hand-off slot.
            self.space_ready.notify_waiters();

            let woken = if may_retire {
                tokio::time::timeout(self.settings.keep_alive, notified.as_mut())
                    .await
                    .is_ok()
            } else {
                notified.as_mut().await;
                true
            };

            let mut st = self.lock();
            st.idle -= 1;
            if !woken && st.jobs.is_empty() && self.may_retire(&st) {
                debug!(pool = %self.base.name(), "idle worker retired after keep-alive");
                self.retire(&mut st);
                return None;
            }
        }
    }

    fn may_retire(&self, st: &State) -> bool {
        self.settings.allow_core_thread_timeout || st.workers > self.settings.min_threads
    }

    fn retire(&self, st: &mut State) {
        st.workers -= 1;
        self.try_terminate(st);
        self.space_ready.notify_waiters();
    }

    fn worker_lost(&self, name: &str) {
        let mut st = self.lock();
        st.busy.remove(name);
        self.retire(&mut st);
    }

    fn try_terminate(&self, st: &mut State) {
        if st.phase == PoolState::ShuttingDown && st.workers == 0 {
            st.phase = PoolState::Terminated;
            self.base.terminated.cancel();
            debug!(pool = %self.base.name(), "pool terminated");
        }
    }

    fn begin_shutdown(&self, st: &mut State) {
        if st.phase == PoolState::Running {
            st.phase = PoolState::ShuttingDown;
            debug!(pool = %self.base.name(), queued = st.jobs.len(), "pool shutting down");
        }
        self.try_terminate(st);
    }

    fn wake_all(&self) {
        self.job_ready.notify_waiters();
        self.space_ready.notify_waiters();
    }
}

#[async_trait]
impl Executor for WorkerPool {
    fn name(&self) -> &str {
        self.shared.base.name()
    }

    fn state(&self) -> PoolState {
        self.shared.lock().phase
    }

    fn shutdown(&self) {
        let mut st = self.shared.lock();
        self.shared.begin_shutdown(&mut st);
        drop(st);
        self.shared.wake_all();
    }

    fn shutdown_now(&self) -> usize {
        let discarded = {
            let mut st = self.shared.lock();
            self.shared.begin_shutdown(&mut st);
            let discarded = std::mem::take(&mut st.jobs);
            self.shared.base.instruments.queue_depth(0);
            discarded
        };
        let abandoned = discarded.len();
        drop(discarded);

        self.shared.base.interrupt.cancel();
        self.shared.wake_all();
        abandoned
    }

    fn busy_workers(&self) -> Vec<String> {
        self.shared.lock().busy.iter().cloned().collect()
    }

    async fn await_termination(&self, timeout: Duration) -> bool {
        self.shared.base.await_termination(timeout).await
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.shared.base.name())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Semaphore;

    use crate::pools::instruments::PoolInstruments;
    use crate::pools::thread_factory::{DefaultThreadFactory, NameFormat};
    use crate::telemetry::InMemorySink;

    fn pool(name: &str, settings: WorkerPoolSettings) -> (WorkerPool, Arc<InMemorySink>) {
        let sink = Arc::new(InMemorySink::new());
        let names = NameFormat::new(name);
        let instruments = PoolInstruments::new(sink.clone(), &names.metric_prefix());
        let base = PoolBase::new(
            names,
            Arc::new(DefaultThreadFactory::new()),
            instruments,
            Duration::ZERO,
        );
        (WorkerPool::new(base, settings), sink)
    }

    fn single(queue: WorkQueue, rejection: RejectionPolicy) -> WorkerPoolSettings {
        WorkerPoolSettings {
            min_threads: 1,
            max_threads: 1,
            keep_alive: Duration::from_secs(60),
            allow_core_thread_timeout: false,
            queue,
            rejection,
        }
    }

    /// Occupies the pool's only worker until the returned gate gets a permit.
    async fn occupy(pool: &WorkerPool) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        let held = gate.clone();
        pool.execute(move |_ctx| async move {
            let _ = held.acquire().await;
        })
        .await
        .unwrap();
        while pool.stats().busy == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        gate
    }

    #[tokio::test]
    async fn workers_are_named_from_the_template() {
        let (pool, _) = pool("jobs-%d", single(WorkQueue::Unbounded, RejectionPolicy::Abort));

        let handle = pool
            .submit(|_ctx| async { std::thread::current().name().map(str::to_owned) })
            .await
            .unwrap();
        assert_eq!(handle.await.unwrap().as_deref(), Some("jobs-0"));
    }

    #[tokio::test]
    async fn abort_rejects_when_saturated() {
        let (pool, sink) = pool("abort-%d", single(WorkQueue::Handoff, RejectionPolicy::Abort));
        let gate = occupy(&pool).await;

        let err = pool.execute(|_ctx| async {}).await.unwrap_err();
        assert_eq!(
            err,
            SubmitError::Rejected {
                pool: "abort-%d".into()
            }
        );
        assert_eq!(sink.counter("abort.jobs.rejected"), 1);
        gate.add_permits(1);
    }

    #[tokio::test]
    async fn caller_runs_in_the_submitting_task() {
        let (pool, sink) = pool("cr-%d", single(WorkQueue::Handoff, RejectionPolicy::CallerRuns));
        let gate = occupy(&pool).await;

        let ran_on = Arc::new(Mutex::new(None));
        let slot = ran_on.clone();
        pool.execute(move |_ctx| async move {
            *slot.lock().unwrap() = std::thread::current().name().map(str::to_owned);
        })
        .await
        .unwrap();

        let name = ran_on.lock().unwrap().clone();
        assert_ne!(name.as_deref(), Some("cr-0"));
        assert_eq!(sink.counter("cr.jobs.rejected"), 1);
        gate.add_permits(1);
    }

    #[tokio::test]
    async fn caller_runs_are_tracked_apart_from_workers() {
        let (pool, _) = pool("crs-%d", single(WorkQueue::Handoff, RejectionPolicy::CallerRuns));
        let gate = occupy(&pool).await;
        let callers = Arc::new(Semaphore::new(0));

        let mut submitters = Vec::new();
        for _ in 0..2 {
            let pool = pool.clone();
            let callers = callers.clone();
            submitters.push(tokio::spawn(async move {
                pool.execute(move |_ctx| async move {
                    let _ = callers.acquire().await;
                })
                .await
            }));
        }
        tokio::time::timeout(Duration::from_secs(5), async {
            while pool.stats().caller_runs < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("both submitters run their job");

        assert_eq!(pool.stats().busy, 1);
        assert_eq!(pool.busy_workers(), vec!["crs-0".to_owned()]);

        callers.add_permits(2);
        for submitter in submitters {
            assert!(submitter.await.unwrap().is_ok());
        }
        assert_eq!(pool.stats().caller_runs, 0);
        gate.add_permits(1);
    }

    #[tokio::test]
    async fn discard_drops_the_new_job() {
        let (pool, _) = pool("discard-%d", single(WorkQueue::Bounded(1), RejectionPolicy::Discard));
        let gate = occupy(&pool).await;
        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let ran = ran.clone();
            pool.execute(move |_ctx| async move {
                ran.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }
        assert_eq!(pool.stats().queued, 1);

        gate.add_permits(1);
        pool.shutdown();
        assert!(pool.await_termination(Duration::from_secs(5)).await);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn discard_oldest_keeps_the_newest_job() {
        let (pool, _) = pool(
            "oldest-%d",
            single(WorkQueue::Bounded(1), RejectionPolicy::DiscardOldest),
        );
        let gate = occupy(&pool).await;
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let seen = seen.clone();
            pool.execute(move |_ctx| async move {
                seen.lock().unwrap().push(i);
            })
            .await
            .unwrap();
        }

        gate.add_permits(1);
        pool.shutdown();
        assert!(pool.await_termination(Duration::from_secs(5)).await);
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn discard_oldest_uses_room_that_opened_after_the_offer() {
        let (pool, sink) = pool(
            "recheck-%d",
            single(WorkQueue::Bounded(1), RejectionPolicy::DiscardOldest),
        );
        pool.execute(|_ctx| async {}).await.unwrap();
        while pool.stats().idle == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let ran = Arc::new(AtomicUsize::new(0));
        let flag = ran.clone();
        pool.shared
            .replace_oldest(Job::new(move |_ctx| async move {
                flag.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        pool.shutdown();
        assert!(pool.await_termination(Duration::from_secs(5)).await);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(sink.counter("recheck.jobs.rejected"), 0);
    }

    #[tokio::test]
    async fn block_waits_for_space() {
        let (pool, sink) = pool("block-%d", single(WorkQueue::Bounded(1), RejectionPolicy::Block));
        let gate = occupy(&pool).await;
        pool.execute(|_ctx| async {}).await.unwrap();

        let blocked = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.execute(|_ctx| async {}).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!blocked.is_finished());
        assert_eq!(sink.counter("block.jobs.rejected"), 1);

        gate.add_permits(1);
        let res = tokio::time::timeout(Duration::from_secs(5), blocked)
            .await
            .expect("unblocked in time")
            .unwrap();
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn grows_to_max_when_queue_is_full_then_retires() {
        let settings = WorkerPoolSettings {
            min_threads: 1,
            max_threads: 3,
            keep_alive: Duration::from_millis(50),
            allow_core_thread_timeout: false,
            queue: WorkQueue::Handoff,
            rejection: RejectionPolicy::Abort,
        };
        let (pool, _) = pool("elastic-%d", settings);
        let gate = Arc::new(Semaphore::new(0));

        for _ in 0..3 {
            let gate = gate.clone();
            pool.execute(move |_ctx| async move {
                let _ = gate.acquire().await;
            })
            .await
            .unwrap();
        }
        assert_eq!(pool.stats().workers, 3);

        gate.add_permits(3);
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(pool.stats().workers, 1);
    }

    #[tokio::test]
    async fn zero_core_threads_still_serve_the_queue() {
        let settings = WorkerPoolSettings {
            min_threads: 0,
            ..single(WorkQueue::Unbounded, RejectionPolicy::Abort)
        };
        let (pool, _) = pool("lazy-%d", settings);

        let handle = pool.submit(|_ctx| async { "served" }).await.unwrap();
        assert_eq!(handle.await, Ok("served"));
        assert_eq!(pool.stats().workers, 1);
    }

    #[tokio::test]
    async fn shutdown_runs_queued_jobs_then_refuses_new_ones() {
        let (pool, sink) = pool("drain-%d", single(WorkQueue::Unbounded, RejectionPolicy::Abort));
        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let ran = ran.clone();
            pool.execute(move |_ctx| async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                ran.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }
        pool.shutdown();

        assert!(matches!(
            pool.execute(|_ctx| async {}).await,
            Err(SubmitError::ShutDown { .. })
        ));
        assert!(pool.await_termination(Duration::from_secs(5)).await);
        assert!(pool.is_terminated());
        assert_eq!(ran.load(Ordering::SeqCst), 5);
        assert_eq!(sink.counter("drain.jobs.completed"), 5);
        assert_eq!(sink.counter("drain.jobs.submitted"), 6);
    }

    #[tokio::test]
    async fn shutdown_now_discards_queue_and_interrupts() {
        let (pool, _) = pool("now-%d", single(WorkQueue::Unbounded, RejectionPolicy::Abort));
        let gate = occupy(&pool).await;
        for _ in 0..4 {
            pool.execute(|_ctx| async {}).await.unwrap();
        }
        let pending = pool.submit(|_ctx| async { 1 }).await.unwrap();

        assert_eq!(pool.shutdown_now(), 5);
        assert!(pool.await_termination(Duration::from_secs(5)).await);
        assert_eq!(pending.await, Err(crate::error::JobError::Abandoned));
        drop(gate);
    }
}
