//! Metrics sinks for pool instrumentation.
//!
//! Pools built through a [`Lifecycle`](crate::Lifecycle) export their activity
//! (submitted/running/completed jobs, queue depth, thread churn) into one injected
//! [`MetricsSink`]. The lifecycle never reaches for a process-wide registry: the
//! sink is passed in at construction.
//!
//! ## Contents
//! - [`MetricsSink`] the string-keyed collection point consumed by pools
//! - [`NoopSink`] discards everything
//! - [`InMemorySink`] keeps the latest values, for tests and health endpoints
//! - [`FacadeSink`] forwards to the `metrics` crate facade (default; Prometheus exporters etc.)

mod facade;
mod memory;
mod sink;

pub use facade::FacadeSink;
pub use memory::{HistogramSummary, InMemorySink};
pub use sink::{MetricsSink, NoopSink};
