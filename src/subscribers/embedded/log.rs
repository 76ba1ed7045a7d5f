//! # LogWriter: lifecycle events as `tracing` records
//!
//! A minimal subscriber that renders incoming [`Event`]s through the `tracing`
//! macros. Installing a `tracing` subscriber is left to the application.
//!
//! ## Example output
//! ```text
//! INFO  resource starting resource="db"
//! INFO  resource started resource="db"
//! INFO  shutdown requested
//! INFO  resource stopping resource="jobs-%d"
//! WARN  pool grace exceeded, forced termination resource="jobs-%d" grace_ms=100 abandoned=3
//! ERROR resource failed to stop resource="cache" reason="flush failed"
//! ```

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let resource = e.resource.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::ShutdownRequested => info!("shutdown requested"),
            EventKind::ResourceStarting => info!(resource, "resource starting"),
            EventKind::ResourceStarted => info!(resource, "resource started"),
            EventKind::ResourceStartFailed => {
                error!(resource, reason, "resource failed to start")
            }
            EventKind::ResourceStopping => info!(resource, "resource stopping"),
            EventKind::ResourceStopped => info!(resource, "resource stopped"),
            EventKind::ResourceStopFailed => {
                error!(resource, reason, "resource failed to stop")
            }
            EventKind::PoolDrained => {
                info!(resource, grace_ms = e.grace_ms, "pool drained within grace")
            }
            EventKind::GraceExceeded => warn!(
                resource,
                grace_ms = e.grace_ms,
                abandoned = e.abandoned,
                reason,
                "pool grace exceeded, forced termination"
            ),
            EventKind::ShutdownInterrupted => warn!(
                resource,
                abandoned = e.abandoned,
                "pool shutdown interrupted, forced termination"
            ),
            EventKind::SubscriberOverflow => {
                warn!(subscriber = resource, reason, "subscriber overflow")
            }
            EventKind::SubscriberPanicked => {
                error!(subscriber = resource, reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
