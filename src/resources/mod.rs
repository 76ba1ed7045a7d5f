//! # Managed resources.
//!
//! - [`Managed`] trait for anything with a start/stop lifecycle
//! - [`ManagedFn`] closure-backed implementation
//! - [`ManagedRef`] shared handle (`Arc<dyn Managed>`)

mod managed;
mod managed_fn;

pub use managed::{Managed, ManagedRef};
pub use managed_fn::ManagedFn;
