//! # Example: custom_subscriber
//!
//! Demonstrates how to build and attach a custom event subscriber.
//!
//! Shows how to:
//! - Implement the [`Subscribe`] trait.
//! - Inspect [`Event`] / [`EventKind`] for the start/stop sweep.
//! - Wire the subscriber into [`Lifecycle::builder`].
//!
//! ## Flow
//! ```text
//! Lifecycle::start() / stop()
//!     ├─► publish(ResourceStarting / ResourceStarted / ResourceStopping / ...)
//!     ├─► ExecutorManager::stop() ─► publish(PoolDrained | GraceExceeded)
//!     └─► subscriber_listener
//!           └─► SubscriberSet.emit() ──► ConsoleSubscriber.on_event()
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example custom_subscriber
//! ```

use std::{sync::Arc, time::Duration};

use lifevisor::{
    Event, EventKind, Lifecycle, LifecycleConfig, ManagedFn, ResourceError, Subscribe,
};

/// A simple console subscriber that prints selected events.
struct ConsoleSubscriber;

#[async_trait::async_trait]
impl Subscribe for ConsoleSubscriber {
    async fn on_event(&self, ev: &Event) {
        let resource = ev.resource.as_deref().unwrap_or("<unknown>");
        match ev.kind {
            EventKind::ResourceStarting => println!("[sub] starting: {resource}"),
            EventKind::ResourceStarted => println!("[sub] started:  {resource}"),
            EventKind::ResourceStartFailed => println!(
                "[sub] start failed: {resource} reason={}",
                ev.reason.as_deref().unwrap_or("<none>")
            ),
            EventKind::ShutdownRequested => println!("[sub] shutdown requested"),
            EventKind::ResourceStopping => println!("[sub] stopping: {resource}"),
            EventKind::ResourceStopped => println!("[sub] stopped:  {resource}"),
            EventKind::ResourceStopFailed => println!(
                "[sub] stop failed: {resource} reason={}",
                ev.reason.as_deref().unwrap_or("<none>")
            ),
            EventKind::PoolDrained => println!(
                "[sub] drained:  {resource} grace={}ms",
                ev.grace_ms.unwrap_or(0)
            ),
            EventKind::GraceExceeded | EventKind::ShutdownInterrupted => println!(
                "[sub] forced:   {resource} abandoned={}",
                ev.abandoned.unwrap_or(0)
            ),
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {}
        }
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(ConsoleSubscriber)];
    let lifecycle = Lifecycle::builder(LifecycleConfig::default())
        .with_subscribers(subs)
        .build();

    lifecycle.manage(
        ManagedFn::new("cache")
            .on_stop(|| async { Err(ResourceError::failed("flush failed")) })
            .arc(),
    );
    let pool = lifecycle.worker_pool("workers-%d").build()?;
    pool.execute(|_ctx| async {
        tokio::time::sleep(Duration::from_millis(50)).await;
    })
    .await?;

    let result = lifecycle.run_until(async {}).await;
    println!("[main] result: {result:?}");

    // Let the subscriber drain its queue before exiting.
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(())
}
