//! # Startable/stoppable resource abstraction.
//!
//! This module defines the [`Managed`] trait (async start/stop, both optional) and the
//! shared handle type [`ManagedRef`] (`Arc<dyn Managed>`) the lifecycle keeps in its
//! registry.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ResourceError;

/// Shared handle to a managed resource.
pub type ManagedRef = Arc<dyn Managed>;

/// # Resource with a start/stop lifecycle.
///
/// Both methods default to a no-op, so a resource implements only what it needs.
/// [`name`](Managed::name) appears in logs, events and errors.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use lifevisor::{Managed, ResourceError};
///
/// struct Cache;
///
/// #[async_trait]
/// impl Managed for Cache {
///     fn name(&self) -> &str { "cache" }
///
///     async fn start(&self) -> Result<(), ResourceError> {
///         // warm up...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Managed: Send + Sync + 'static {
    /// Returns a human-readable resource name.
    ///
    /// The default uses `type_name::<Self>()`; override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Brings the resource up. Called once, in registration order.
    async fn start(&self) -> Result<(), ResourceError> {
        Ok(())
    }

    /// Brings the resource down. Called once, in reverse registration order.
    async fn stop(&self) -> Result<(), ResourceError> {
        Ok(())
    }
}
