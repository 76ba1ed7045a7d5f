//! # Work queue shapes.
//!
//! [`WorkQueue`] describes where a worker pool parks jobs no worker has picked up yet.
//!
//! ```text
//! Unbounded   → every job is queued; the pool never grows past min_threads
//! Bounded(n)  → up to n queued jobs; beyond that the pool grows towards max_threads
//! Handoff     → capacity 0: a job is accepted only by an idle worker waiting for it
//! ```

/// Work queue configuration of a worker pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorkQueue {
    /// No bound on queued jobs (default).
    #[default]
    Unbounded,
    /// At most `n` queued jobs. `Bounded(0)` behaves as [`WorkQueue::Handoff`].
    Bounded(usize),
    /// Synchronous hand-off: no job is stored unless a worker is idle and waiting for it.
    Handoff,
}

impl WorkQueue {
    /// Builds a queue from an optional capacity: `None` → unbounded, `Some(0)` → hand-off.
    ///
    /// ```
    /// use lifevisor::WorkQueue;
    ///
    /// assert_eq!(WorkQueue::with_capacity(None), WorkQueue::Unbounded);
    /// assert_eq!(WorkQueue::with_capacity(Some(0)), WorkQueue::Handoff);
    /// assert_eq!(WorkQueue::with_capacity(Some(8)), WorkQueue::Bounded(8));
    /// ```
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        match capacity {
            None => WorkQueue::Unbounded,
            Some(0) => WorkQueue::Handoff,
            Some(n) => WorkQueue::Bounded(n),
        }
    }

    /// Returns `true` if the queue has no fixed bound.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, WorkQueue::Unbounded)
    }

    /// Decides whether one more job may be queued.
    ///
    /// `queued` is the current queue length, `idle` the number of workers waiting for work.
    #[inline]
    pub(crate) fn accepts(&self, queued: usize, idle: usize) -> bool {
        match *self {
            WorkQueue::Unbounded => true,
            WorkQueue::Bounded(0) | WorkQueue::Handoff => queued < idle,
            WorkQueue::Bounded(n) => queued < n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handoff_only_accepts_while_a_worker_waits() {
        let q = WorkQueue::Handoff;
        assert!(!q.accepts(0, 0));
        assert!(q.accepts(0, 1));
        assert!(!q.accepts(1, 1));
        assert!(!WorkQueue::Bounded(0).accepts(0, 0));
    }

    #[test]
    fn bounded_ignores_idle_workers() {
        let q = WorkQueue::Bounded(2);
        assert!(q.accepts(1, 0));
        assert!(!q.accepts(2, 5));
        assert!(WorkQueue::Unbounded.accepts(usize::MAX - 1, 0));
    }
}
