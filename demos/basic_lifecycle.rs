//! # Example: basic_lifecycle
//!
//! Registers two plain resources and a worker pool, then runs until Ctrl-C.
//!
//! ## Flow
//! ```text
//! start():  config ─► database ─► jobs-%d
//! (Ctrl-C)
//! stop():   jobs-%d ─► database ─► config
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example basic_lifecycle
//! ```

use std::time::Duration;

use lifevisor::{Lifecycle, LifecycleConfig, ManagedFn, ResourceError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let lifecycle = Lifecycle::new(LifecycleConfig::default());

    lifecycle.manage(
        ManagedFn::new("config")
            .on_start(|| async {
                println!("[config] loaded");
                Ok::<_, ResourceError>(())
            })
            .arc(),
    );
    lifecycle.manage(
        ManagedFn::new("database")
            .on_start(|| async {
                println!("[database] connected");
                Ok::<_, ResourceError>(())
            })
            .on_stop(|| async {
                println!("[database] connection closed");
                Ok::<_, ResourceError>(())
            })
            .arc(),
    );

    let jobs = lifecycle
        .worker_pool("jobs-%d")
        .min_threads(2)
        .max_threads(4)
        .queue_capacity(Some(8))
        .shutdown_period(Duration::from_secs(2))
        .build()?;

    for n in 0..4 {
        jobs.execute(move |_ctx| async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            println!("[jobs] job {n} done on {:?}", std::thread::current().name());
        })
        .await?;
    }

    println!("running; press Ctrl-C to stop");
    lifecycle.run().await?;
    println!("stopped cleanly");
    Ok(())
}
