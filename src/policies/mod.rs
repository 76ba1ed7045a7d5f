//! Pool policies.
//!
//! This module groups the knobs that control **where** a worker pool parks work it
//! cannot run yet and **what** it does once it cannot take any more.
//!
//! ## Contents
//! - [`WorkQueue`] unbounded / bounded / hand-off queueing
//! - [`RejectionPolicy`] behaviour of a saturated pool
//!
//! ## Quick wiring
//! ```text
//! WorkerPool::execute(job)
//!   ├─► workers < min          → start a worker for the job
//!   ├─► WorkQueue accepts      → queue the job
//!   ├─► workers < max          → start a worker for the job
//!   └─► RejectionPolicy        → caller-runs / block / discard / discard-oldest / abort
//! ```
//!
//! ## Defaults
//! - `WorkQueue::Unbounded`
//! - `RejectionPolicy::CallerRuns`

mod queue;
mod rejection;

pub use queue::WorkQueue;
pub use rejection::RejectionPolicy;
