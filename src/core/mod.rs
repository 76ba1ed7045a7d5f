//! Runtime core: the lifecycle registry and pool adapters.
//!
//! Internal modules:
//! - [`lifecycle`]: the resource registry with ordered start and reverse-ordered stop;
//! - [`builder`]: wires the bus, subscribers and metrics sink into a lifecycle;
//! - [`manager`]: adapts a pool to the managed-resource protocol with grace and escalation;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod lifecycle;
mod manager;
mod shutdown;

pub use builder::LifecycleBuilder;
pub use lifecycle::Lifecycle;
pub use manager::ExecutorManager;
pub use shutdown::{ShutdownSignal, ShutdownSignals, wait_for_shutdown_signal};
