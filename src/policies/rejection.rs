//! # Rejection policies for saturated worker pools.
//!
//! [`RejectionPolicy`] decides what happens to a job when the pool has no free worker,
//! cannot start another one (`max_threads` reached) and the work queue has no slot.
//!
//! - [`RejectionPolicy::CallerRuns`] the submitting task runs the job itself (default).
//! - [`RejectionPolicy::Block`] the submitter waits until a worker or queue slot frees up.
//! - [`RejectionPolicy::Discard`] the job is dropped silently.
//! - [`RejectionPolicy::DiscardOldest`] the oldest queued job is dropped to make room.
//! - [`RejectionPolicy::Abort`] the submission fails with `SubmitError::Rejected`.
//!
//! ## Choosing the right policy
//! ```text
//! Natural back-pressure on producers  → CallerRuns or Block
//! Best-effort work (metrics, caches)  → Discard / DiscardOldest
//! Caller must know and retry          → Abort
//! ```
//!
//! Every policy counts the saturation in `jobs.rejected`, including `CallerRuns`
//! and `Block`. `Block` counts once per submission however long it waits.
//! `DiscardOldest` re-checks for room first and counts only when it still has to drop a job. A pool that is shutting down rejects with `SubmitError::ShutDown`
//! regardless of the policy.

/// Policy applied when a worker pool is saturated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RejectionPolicy {
    /// Run the job to completion in the submitter's own task.
    #[default]
    CallerRuns,
    /// Wait until the job is accepted.
    Block,
    /// Drop the job without running it.
    Discard,
    /// Drop the oldest queued job and enqueue the new one.
    ///
    /// With nothing queued (e.g. a hand-off queue) the new job is dropped instead.
    DiscardOldest,
    /// Fail the submission with `SubmitError::Rejected`.
    Abort,
}

impl RejectionPolicy {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RejectionPolicy::CallerRuns => "caller_runs",
            RejectionPolicy::Block => "block",
            RejectionPolicy::Discard => "discard",
            RejectionPolicy::DiscardOldest => "discard_oldest",
            RejectionPolicy::Abort => "abort",
        }
    }
}
