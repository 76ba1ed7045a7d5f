//! # Example: pools
//!
//! A worker pool with a hand-off queue and a scheduled pool with a fixed-rate heartbeat.
//! The worker pool gets a job that ignores its cancellation token, so shutdown has to
//! escalate once its grace period runs out.
//!
//! ## Flow
//! ```text
//! heartbeat-%d ── every 250ms ─► "tick"
//! io-%d        ── slow job (10s) ─► stop(): grace 500ms ─► GraceExceeded ─► forced drop
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example pools --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use lifevisor::{
    InMemorySink, Lifecycle, LifecycleConfig, LogWriter, RejectionPolicy, Subscribe, WorkQueue,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let sink = Arc::new(InMemorySink::new());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let lifecycle = Lifecycle::builder(LifecycleConfig::default())
        .with_subscribers(subs)
        .with_metrics(sink.clone())
        .build();

    let io = lifecycle
        .worker_pool("io-%d")
        .min_threads(1)
        .max_threads(2)
        .queue(WorkQueue::Handoff)
        .rejection_policy(RejectionPolicy::CallerRuns)
        .shutdown_period(Duration::from_millis(500))
        .build()?;

    let heartbeat = lifecycle
        .scheduled_pool("heartbeat-%d")
        .remove_on_cancel(true)
        .build()?;

    heartbeat.schedule_at_fixed_rate(Duration::ZERO, Duration::from_millis(250), |_ctx| async {
        println!("[heartbeat] tick");
    })?;

    io.execute(|_ctx| async {
        println!("[io] slow job started; it ignores cancellation");
        tokio::time::sleep(Duration::from_secs(10)).await;
        println!("[io] slow job finished (never printed)");
    })
    .await?;

    lifecycle
        .run_until(tokio::time::sleep(Duration::from_secs(1)))
        .await
        .or_else(|err| {
            // Escalation is recoverable: the pool is stopped, work was abandoned.
            for failure in err.stop_failures() {
                println!("[main] {failure} (recoverable: {})", failure.error.is_recoverable());
            }
            Ok::<_, anyhow::Error>(())
        })?;

    for key in sink.keys() {
        if let Some(v) = sink.gauge(&key) {
            println!("[metrics] {key} = {v}");
        } else if let Some(h) = sink.histogram(&key) {
            println!("[metrics] {key} = count {} max {:.3}s", h.count, h.max);
        } else {
            println!("[metrics] {key} = {}", sink.counter(&key));
        }
    }
    Ok(())
}
