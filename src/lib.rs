//! # lifevisor
//!
//! **Lifevisor** is a process-lifecycle manager for long-lived services.
//!
//! It keeps a registry of startable/stoppable resources, most importantly thread pools,
//! and guarantees deterministic ordered startup and graceful, time-bounded shutdown.
//! Pools are created through builders that instrument them and enroll them in the
//! registry, so application code never manages a pool's lifecycle by hand.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────────┐   ┌──────────────────┐
//!     │  ManagedFn / │   │ WorkerPoolBuilder│   │ScheduledPoolBuild│
//!     │ impl Managed │   │   .build()?      │   │   .build()?      │
//!     └──────┬───────┘   └────────┬─────────┘   └────────┬─────────┘
//!            │ manage()           │ ExecutorManager      │ ExecutorManager
//!            ▼                    ▼                      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Lifecycle                                                        │
//! │  - registry: Vec<ManagedRef> (registration order)                 │
//! │  - metrics: Arc<dyn MetricsSink> (shared by every pool)           │
//! │  - interrupt: CancellationToken (cuts pool drain waits short)     │
//! │  - Bus + SubscriberSet (lifecycle events)                         │
//! └──────┬─────────────────────────────────────────────────────┬──────┘
//!        │ start(): in order, fail-fast                        │ events
//!        │ stop():  reverse order, collect-all                 ▼
//!        ▼                                         ┌────────────────────────┐
//!   ┌──────────────────────────────────┐           │  subscriber_listener   │
//!   │ ExecutorManager::stop()          │           └───┬────────────────┬───┘
//!   │  shutdown() ─► wait(grace)       │               ▼                ▼
//!   │   ├─ drained   ─► Ok             │           LogWriter        custom
//!   │   └─ timed out ─► shutdown_now() │          (per-subscriber queues)
//!   │                 ─► ShutdownTimeout
//!   └──────────────────────────────────┘
//! ```
//!
//! ### Pools
//! ```text
//! WorkerPool     ── named OS threads (ThreadFactory) ── current-thread runtime per worker
//!                   min..max threads, WorkQueue, RejectionPolicy, keep-alive
//! ScheduledPool  ── fixed thread count, time-ordered queue
//!                   once / fixed-rate / fixed-delay, cancel handles
//! ```
//! Jobs are `FnOnce(CancellationToken) -> impl Future`. On forced termination the token
//! is cancelled and, after the interrupt grace, the job future is dropped at its next
//! `.await`.
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                          |
//! |-------------------|----------------------------------------------------------------|---------------------------------------------|
//! | **Lifecycle**     | Ordered start, reverse stop, signal-driven run loop.           | [`Lifecycle`], [`Managed`], [`ManagedFn`]   |
//! | **Pools**         | Instrumented worker and scheduled pools.                       | [`WorkerPool`], [`ScheduledPool`]           |
//! | **Policies**      | Queueing and saturation behavior.                              | [`WorkQueue`], [`RejectionPolicy`]          |
//! | **Shutdown**      | Grace period with escalation to forced termination.            | [`ExecutorManager`], [`Executor`]           |
//! | **Metrics**       | Injected sink, `metrics` facade or in-memory.                  | [`MetricsSink`], [`FacadeSink`]             |
//! | **Subscriber API**| Hook into lifecycle events.                                    | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors for configuration, submission and shutdown.       | [`LifecycleError`], [`ResourceError`]       |
//! | **Configuration** | Centralized defaults.                                          | [`LifecycleConfig`]                         |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use lifevisor::{Lifecycle, LifecycleConfig, ManagedFn, ResourceError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lifecycle = Lifecycle::new(LifecycleConfig::default());
//!
//!     lifecycle.manage(
//!         ManagedFn::new("database")
//!             .on_start(|| async { Ok::<_, ResourceError>(()) })
//!             .on_stop(|| async { Ok::<_, ResourceError>(()) })
//!             .arc(),
//!     );
//!
//!     let jobs = lifecycle
//!         .worker_pool("jobs-%d")
//!         .max_threads(4)
//!         .queue_capacity(Some(16))
//!         .shutdown_period(Duration::from_secs(1))
//!         .build()?;
//!
//!     let answer = lifecycle
//!         .run_until(async {
//!             let handle = jobs.submit(|_ctx| async { 6 * 7 }).await.unwrap();
//!             assert_eq!(handle.await.unwrap(), 42);
//!         })
//!         .await;
//!
//!     assert!(answer.is_ok());
//!     Ok(())
//! }
//! ```
mod builders;
mod config;
mod core;
mod error;
mod events;
mod policies;
mod pools;
mod resources;
mod subscribers;
mod telemetry;

// ---- Public re-exports ----

pub use crate::builders::{ScheduledPoolBuilder, WorkerPoolBuilder};
pub use crate::config::LifecycleConfig;
pub use crate::core::{
    ExecutorManager, Lifecycle, LifecycleBuilder, ShutdownSignal, ShutdownSignals,
    wait_for_shutdown_signal,
};
pub use crate::error::{ConfigError, JobError, LifecycleError, ResourceError, StopFailure, SubmitError};
pub use crate::events::{Bus, Event, EventKind};
pub use crate::policies::{RejectionPolicy, WorkQueue};
pub use crate::pools::{
    DefaultThreadFactory, Executor, InstrumentedThreadFactory, JobHandle, NameFormat, PoolState,
    PoolStats, ScheduledHandle, ScheduledPool, ThreadBody, ThreadFactory, WorkerPool,
};
pub use crate::resources::{Managed, ManagedFn, ManagedRef};
pub use crate::subscribers::{Subscribe, SubscriberSet};
pub use crate::telemetry::{FacadeSink, HistogramSummary, InMemorySink, MetricsSink, NoopSink};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use crate::subscribers::LogWriter;
