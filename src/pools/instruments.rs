//! Per-pool job metrics.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use crate::telemetry::MetricsSink;

/// Pre-rendered metric keys of one pool plus the live running-job count.
pub(crate) struct PoolInstruments {
    sink: Arc<dyn MetricsSink>,
    submitted: String,
    rejected: String,
    running: String,
    completed: String,
    duration: String,
    queue_depth: String,
    overrun: String,
    live: AtomicI64,
}

impl PoolInstruments {
    pub(crate) fn new(sink: Arc<dyn MetricsSink>, prefix: &str) -> Self {
        Self {
            sink,
            submitted: format!("{prefix}.jobs.submitted"),
            rejected: format!("{prefix}.jobs.rejected"),
            running: format!("{prefix}.jobs.running"),
            completed: format!("{prefix}.jobs.completed"),
            duration: format!("{prefix}.jobs.duration"),
            queue_depth: format!("{prefix}.queue.depth"),
            overrun: format!("{prefix}.scheduled.overrun"),
            live: AtomicI64::new(0),
        }
    }

    pub(crate) fn submitted(&self) {
        self.sink.increment_counter(&self.submitted, 1);
    }

    pub(crate) fn rejected(&self) {
        self.sink.increment_counter(&self.rejected, 1);
    }

    pub(crate) fn queue_depth(&self, depth: usize) {
        self.sink.set_gauge(&self.queue_depth, depth as f64);
    }

    pub(crate) fn overrun(&self) {
        self.sink.increment_counter(&self.overrun, 1);
    }

    pub(crate) fn job_started(&self) {
        let live = self.live.fetch_add(1, Ordering::Relaxed) + 1;
        self.sink.set_gauge(&self.running, live as f64);
    }

    /// Seconds are recorded in the duration histogram.
    pub(crate) fn job_finished(&self, elapsed: Duration) {
        let live = self.live.fetch_sub(1, Ordering::Relaxed) - 1;
        self.sink.set_gauge(&self.running, live as f64);
        self.sink.increment_counter(&self.completed, 1);
        self.sink.record_histogram(&self.duration, elapsed.as_secs_f64());
    }
}
