//! # In-memory sink.

use dashmap::DashMap;

use super::MetricsSink;

/// Summary of a histogram kept by [`InMemorySink`].
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct HistogramSummary {
    /// Number of observations.
    pub count: u64,
    /// Sum of all observations.
    pub sum: f64,
    /// Largest observation.
    pub max: f64,
}

/// Sink that keeps the latest value of every series in memory.
///
/// Counters accumulate, gauges keep the last value, histograms keep
/// count/sum/max.
#[derive(Debug, Default)]
pub struct InMemorySink {
    counters: DashMap<String, u64>,
    gauges: DashMap<String, f64>,
    histograms: DashMap<String, HistogramSummary>,
}

impl InMemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the counter value, `0` if never incremented.
    pub fn counter(&self, key: &str) -> u64 {
        self.counters.get(key).map(|v| *v).unwrap_or(0)
    }

    /// Returns the last gauge value, if ever set.
    pub fn gauge(&self, key: &str) -> Option<f64> {
        self.gauges.get(key).map(|v| *v)
    }

    /// Returns the histogram summary, if anything was recorded.
    pub fn histogram(&self, key: &str) -> Option<HistogramSummary> {
        self.histograms.get(key).map(|v| *v)
    }

    /// Returns every known key, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .counters
            .iter()
            .map(|e| e.key().clone())
            .chain(self.gauges.iter().map(|e| e.key().clone()))
            .chain(self.histograms.iter().map(|e| e.key().clone()))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

impl MetricsSink for InMemorySink {
    fn increment_counter(&self, key: &str, value: u64) {
        *self.counters.entry(key.to_owned()).or_insert(0) += value;
    }

    fn set_gauge(&self, key: &str, value: f64) {
        self.gauges.insert(key.to_owned(), value);
    }

    fn record_histogram(&self, key: &str, value: f64) {
        let mut entry = self.histograms.entry(key.to_owned()).or_default();
        entry.count += 1;
        entry.sum += value;
        if entry.count == 1 || value > entry.max {
            entry.max = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_per_kind() {
        let sink = InMemorySink::new();
        sink.increment_counter("pool.jobs.completed", 2);
        sink.increment_counter("pool.jobs.completed", 3);
        sink.set_gauge("pool.queue.depth", 4.0);
        sink.set_gauge("pool.queue.depth", 1.0);
        sink.record_histogram("pool.jobs.duration", 0.5);
        sink.record_histogram("pool.jobs.duration", 1.5);

        assert_eq!(sink.counter("pool.jobs.completed"), 5);
        assert_eq!(sink.counter("missing"), 0);
        assert_eq!(sink.gauge("pool.queue.depth"), Some(1.0));
        assert_eq!(
            sink.histogram("pool.jobs.duration"),
            Some(HistogramSummary {
                count: 2,
                sum: 2.0,
                max: 1.5
            })
        );
        assert_eq!(
            sink.keys(),
            vec!["pool.jobs.completed", "pool.jobs.duration", "pool.queue.depth"]
        );
    }
}
