//! # The metrics collection point.

/// String-keyed collection point for counters, gauges and histograms.
///
/// Keys are caller-owned: two pools with the same name template write into the same
/// series. Implementations must be cheap and non-blocking; they are called from worker
/// threads on every job.
pub trait MetricsSink: Send + Sync + 'static {
    /// Adds `value` to the counter `key`.
    fn increment_counter(&self, key: &str, value: u64);

    /// Sets the gauge `key` to `value`.
    fn set_gauge(&self, key: &str, value: f64);

    /// Records one observation of `value` into the histogram `key`.
    fn record_histogram(&self, key: &str, value: f64);
}

/// Sink that discards every observation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn increment_counter(&self, _key: &str, _value: u64) {}

    fn set_gauge(&self, _key: &str, _value: f64) {}

    fn record_histogram(&self, _key: &str, _value: f64) {}
}
