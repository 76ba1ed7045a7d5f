//! Thread pools managed by the lifecycle.
//!
//! ## Contents
//! - [`WorkerPool`] one-shot jobs on an elastic set of threads
//! - [`ScheduledPool`] delayed and periodic jobs on a fixed set of threads
//! - [`Executor`] the shutdown surface both expose to [`ExecutorManager`](crate::ExecutorManager)
//! - [`ThreadFactory`], [`DefaultThreadFactory`], [`InstrumentedThreadFactory`], [`NameFormat`]
//!   thread creation and naming
//! - [`JobHandle`], [`ScheduledHandle`] what submissions hand back

mod base;
mod executor;
mod instruments;
mod job;
mod scheduled_pool;
mod thread_factory;
mod worker_pool;

pub(crate) use base::PoolBase;
pub(crate) use instruments::PoolInstruments;
pub(crate) use job::panic_message;
pub(crate) use worker_pool::WorkerPoolSettings;

pub use executor::{Executor, PoolState};
pub use job::JobHandle;
pub use scheduled_pool::{ScheduledHandle, ScheduledPool};
pub use thread_factory::{
    DefaultThreadFactory, InstrumentedThreadFactory, NameFormat, ThreadBody, ThreadFactory,
};
pub use worker_pool::{PoolStats, WorkerPool};
