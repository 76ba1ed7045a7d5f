//! # Pool builders.
//!
//! Obtained from [`Lifecycle::worker_pool`](crate::Lifecycle::worker_pool) and
//! [`Lifecycle::scheduled_pool`](crate::Lifecycle::scheduled_pool). Every setter is
//! optional; `build()` validates, instruments, registers the pool with the lifecycle and
//! returns it.
//!
//! ```text
//! build()
//!   ├─ validate bounds              ─► Err(ConfigError), nothing registered
//!   ├─ NameFormat(template)         ─► thread names + metric prefix
//!   ├─ InstrumentedThreadFactory    ─► threads.created / running / terminated
//!   ├─ PoolInstruments              ─► jobs.* / queue.depth / scheduled.overrun
//!   ├─ lifecycle.register_executor  ─► ExecutorManager(shutdown_period)
//!   └─ pool handle
//! ```

mod scheduled;
mod worker;

use std::sync::Arc;
use std::time::Duration;

pub use scheduled::ScheduledPoolBuilder;
pub use worker::WorkerPoolBuilder;

use crate::pools::{
    DefaultThreadFactory, InstrumentedThreadFactory, NameFormat, PoolBase, PoolInstruments,
    ThreadFactory,
};
use crate::telemetry::MetricsSink;

/// Assembles the instrumented plumbing shared by both pool kinds.
fn pool_base(
    template: String,
    factory: Option<Arc<dyn ThreadFactory>>,
    sink: &Arc<dyn MetricsSink>,
    interrupt_grace: Duration,
) -> PoolBase {
    let names = NameFormat::new(template);
    let prefix = names.metric_prefix();
    let inner = factory.unwrap_or_else(|| Arc::new(DefaultThreadFactory::new()));
    let factory = Arc::new(InstrumentedThreadFactory::new(inner, Arc::clone(sink), &prefix));

    PoolBase::new(
        names,
        factory,
        PoolInstruments::new(Arc::clone(sink), &prefix),
        interrupt_grace,
    )
}
