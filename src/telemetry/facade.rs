//! # Forwarding to the `metrics` facade.
//!
//! [`FacadeSink`] hands every observation to whatever recorder the application
//! installed for the `metrics` crate (for example `metrics-exporter-prometheus`).
//! Without an installed recorder the calls are no-ops.

use super::MetricsSink;

/// Sink backed by the global `metrics` recorder.
///
/// An optional prefix is prepended to every key (`"{prefix}.{key}"`).
#[derive(Debug, Default, Clone)]
pub struct FacadeSink {
    prefix: Option<String>,
}

impl FacadeSink {
    /// Creates a sink that forwards keys unchanged.
    pub fn new() -> Self {
        Self { prefix: None }
    }

    /// Creates a sink that prepends `prefix` to every key.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.to_owned(),
        }
    }
}

impl MetricsSink for FacadeSink {
    fn increment_counter(&self, key: &str, value: u64) {
        metrics::counter!(self.key(key)).increment(value);
    }

    fn set_gauge(&self, key: &str, value: f64) {
        metrics::gauge!(self.key(key)).set(value);
    }

    fn record_histogram(&self, key: &str, value: f64) {
        metrics::histogram!(self.key(key)).record(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_joined_with_a_dot() {
        assert_eq!(FacadeSink::with_prefix("app").key("jobs.completed"), "app.jobs.completed");
        assert_eq!(FacadeSink::new().key("jobs.completed"), "jobs.completed");
    }

    #[test]
    fn calls_without_recorder_are_noops() {
        let sink = FacadeSink::new();
        sink.increment_counter("jobs.submitted", 1);
        sink.set_gauge("queue.depth", 3.0);
        sink.record_histogram("jobs.duration", 0.25);
    }
}
