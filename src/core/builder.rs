use std::sync::Arc;

use crate::{
    config::LifecycleConfig,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
    telemetry::{FacadeSink, MetricsSink},
};
use super::lifecycle::Lifecycle;

/// Builder for constructing a [`Lifecycle`] with optional features.
pub struct LifecycleBuilder {
    cfg: LifecycleConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl LifecycleBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: LifecycleConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            metrics: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events (resource start/stop, pool shutdown outcomes)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the sink every pool built through the lifecycle reports into.
    ///
    /// Defaults to [`FacadeSink`], which forwards to whatever `metrics` recorder the
    /// application installed.
    pub fn with_metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Builds the lifecycle.
    ///
    /// Must be called from within a tokio runtime (subscriber workers are spawned here).
    pub fn build(self) -> Lifecycle {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let metrics = self
            .metrics
            .unwrap_or_else(|| Arc::new(FacadeSink::new()));

        Lifecycle::new_internal(self.cfg, bus, subs, metrics)
    }
}
