//! # Closure-backed resource (`ManagedFn`)
//!
//! [`ManagedFn`] builds a [`Managed`] resource from a start closure and/or a stop closure,
//! for resources that do not deserve their own type.
//!
//! ## Example
//! ```rust
//! use lifevisor::{ManagedFn, ManagedRef, ResourceError};
//!
//! let r: ManagedRef = ManagedFn::new("migrations")
//!     .on_start(|| async {
//!         // run migrations...
//!         Ok::<_, ResourceError>(())
//!     })
//!     .arc();
//!
//! assert_eq!(r.name(), "migrations");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::ResourceError;
use crate::resources::managed::Managed;

type Hook = Box<dyn Fn() -> BoxFuture<'static, Result<(), ResourceError>> + Send + Sync>;

/// Function-backed resource.
///
/// Each hook creates a fresh future per call; share state through `Arc` captured in the
/// closures.
pub struct ManagedFn {
    name: Cow<'static, str>,
    start: Option<Hook>,
    stop: Option<Hook>,
}

impl ManagedFn {
    /// Creates a resource whose start and stop do nothing.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            start: None,
            stop: None,
        }
    }

    /// Sets the start hook.
    pub fn on_start<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ResourceError>> + Send + 'static,
    {
        self.start = Some(Box::new(move || f().boxed()));
        self
    }

    /// Sets the stop hook.
    pub fn on_stop<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ResourceError>> + Send + 'static,
    {
        self.stop = Some(Box::new(move || f().boxed()));
        self
    }

    /// Returns the resource as a shared handle.
    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl Managed for ManagedFn {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), ResourceError> {
        match &self.start {
            Some(hook) => hook().await,
            None => Ok(()),
        }
    }

    async fn stop(&self) -> Result<(), ResourceError> {
        match &self.stop {
            Some(hook) => hook().await,
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for ManagedFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedFn")
            .field("name", &self.name)
            .field("start", &self.start.is_some())
            .field("stop", &self.stop.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hooks_default_to_noop() {
        let r = ManagedFn::new("plain");
        assert!(r.start().await.is_ok());
        assert!(r.stop().await.is_ok());
    }

    #[tokio::test]
    async fn stop_hook_error_is_returned() {
        let r = ManagedFn::new("flaky").on_stop(|| async { Err(ResourceError::failed("disk gone")) });
        assert!(r.start().await.is_ok());
        let err = r.stop().await.unwrap_err();
        assert_eq!(err.as_label(), "resource_failed");
    }
}
