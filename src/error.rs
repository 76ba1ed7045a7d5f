//! Error types used by the lifevisor runtime, its pools and managed resources.
//!
//! This module defines the following enums:
//!
//! - [`LifecycleError`]: errors raised by the [`Lifecycle`](crate::Lifecycle) start/stop sweep.
//! - [`ResourceError`]: errors raised by a single [`Managed`](crate::Managed) resource.
//! - [`ConfigError`]: invalid pool configuration detected by a builder's `build()`.
//! - [`SubmitError`]: a pool refused a job.
//! - [`JobError`]: a submitted job never produced its value.
//!
//! The types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the lifecycle sweep.
///
/// Startup is fail-fast, shutdown is collect-all: [`LifecycleError::ShutdownFailed`]
/// is only returned after **every** resource had its `stop` attempted.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// A resource failed to start; the remaining resources were not started.
    #[error("resource {resource:?} failed to start: {source}")]
    StartupFailed {
        /// Name of the failing resource.
        resource: String,
        /// The error returned by its `start`.
        #[source]
        source: ResourceError,
    },

    /// One or more resources failed to stop cleanly.
    #[error("{} resource(s) failed to stop; first: {primary}", .suppressed.len() + 1)]
    ShutdownFailed {
        /// The first failure encountered (in stop order).
        primary: StopFailure,
        /// Every later failure.
        suppressed: Vec<StopFailure>,
    },

    /// OS signal handlers could not be installed.
    #[error("failed to install shutdown signal handlers: {0}")]
    Signal(#[from] std::io::Error),
}

impl LifecycleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use lifevisor::{LifecycleError, ResourceError};
    ///
    /// let err = LifecycleError::StartupFailed {
    ///     resource: "db".into(),
    ///     source: ResourceError::failed("connection refused"),
    /// };
    /// assert_eq!(err.as_label(), "lifecycle_startup_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleError::StartupFailed { .. } => "lifecycle_startup_failed",
            LifecycleError::ShutdownFailed { .. } => "lifecycle_shutdown_failed",
            LifecycleError::Signal(_) => "lifecycle_signal_setup",
        }
    }

    /// Returns every stop failure, primary first; empty for other variants.
    pub fn stop_failures(&self) -> Vec<&StopFailure> {
        match self {
            LifecycleError::ShutdownFailed {
                primary,
                suppressed,
            } => std::iter::once(primary).chain(suppressed.iter()).collect(),
            _ => Vec::new(),
        }
    }
}

/// A single resource that failed to stop, as collected by [`LifecycleError::ShutdownFailed`].
#[derive(Debug)]
pub struct StopFailure {
    /// Name of the resource.
    pub resource: String,
    /// The error returned by its `stop`.
    pub error: ResourceError,
}

impl fmt::Display for StopFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.resource, self.error)
    }
}

impl std::error::Error for StopFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// # Errors produced by a managed resource.
///
/// `ShutdownTimeout` and `ShutdownInterrupted` are **recoverable**: the resource is
/// stopped, but work may have been abandoned on the way.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The resource reported a failure.
    #[error("resource failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The grace period elapsed before the pool drained; it was forcibly terminated.
    #[error("shutdown grace {grace:?} exceeded; abandoned {abandoned} queued job(s); stuck: {stuck:?}")]
    ShutdownTimeout {
        /// The configured grace period.
        grace: Duration,
        /// Number of queued jobs discarded without running.
        abandoned: usize,
        /// Workers still busy after the termination timeout.
        stuck: Vec<String>,
    },

    /// The wait for drainage was interrupted; the pool was forcibly terminated.
    #[error("shutdown interrupted; abandoned {abandoned} queued job(s); stuck: {stuck:?}")]
    ShutdownInterrupted {
        /// Number of queued jobs discarded without running.
        abandoned: usize,
        /// Workers still busy after the termination timeout.
        stuck: Vec<String>,
    },
}

impl ResourceError {
    /// Builds a [`ResourceError::Failed`] from any displayable error.
    pub fn failed(error: impl fmt::Display) -> Self {
        ResourceError::Failed {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ResourceError::Failed { .. } => "resource_failed",
            ResourceError::ShutdownTimeout { .. } => "resource_shutdown_timeout",
            ResourceError::ShutdownInterrupted { .. } => "resource_shutdown_interrupted",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ResourceError::Failed { error } => format!("error: {error}"),
            ResourceError::ShutdownTimeout {
                grace,
                abandoned,
                stuck,
            } => format!("grace exceeded after {grace:?}; abandoned={abandoned}; stuck={stuck:?}"),
            ResourceError::ShutdownInterrupted { abandoned, stuck } => {
                format!("interrupted; abandoned={abandoned}; stuck={stuck:?}")
            }
        }
    }

    /// Indicates whether the resource still reached a stopped state.
    ///
    /// ```
    /// use std::time::Duration;
    /// use lifevisor::ResourceError;
    ///
    /// let timeout = ResourceError::ShutdownTimeout {
    ///     grace: Duration::from_millis(100),
    ///     abandoned: 0,
    ///     stuck: vec![],
    /// };
    /// assert!(timeout.is_recoverable());
    /// assert!(!ResourceError::failed("boom").is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ResourceError::ShutdownTimeout { .. } | ResourceError::ShutdownInterrupted { .. }
        )
    }
}

/// # Invalid pool configuration.
///
/// Returned by `build()`; a failed build registers nothing.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `min_threads` is greater than `max_threads`.
    #[error("min_threads ({min}) must not exceed max_threads ({max})")]
    InvalidThreadBounds {
        /// Configured minimum.
        min: usize,
        /// Configured maximum.
        max: usize,
    },

    /// `max_threads` is zero.
    #[error("max_threads must be at least 1")]
    ZeroMaxThreads,

    /// A scheduled pool was configured with zero threads.
    #[error("scheduled pool needs at least 1 thread")]
    ZeroThreads,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::InvalidThreadBounds { .. } => "config_invalid_thread_bounds",
            ConfigError::ZeroMaxThreads => "config_zero_max_threads",
            ConfigError::ZeroThreads => "config_zero_threads",
        }
    }
}

/// # A pool refused a job.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// No worker and no queue slot was available (`RejectionPolicy::Abort`).
    #[error("pool {pool:?} rejected the job: saturated")]
    Rejected {
        /// Pool display name.
        pool: String,
    },

    /// The pool is shutting down or terminated.
    #[error("pool {pool:?} is shut down")]
    ShutDown {
        /// Pool display name.
        pool: String,
    },

    /// A worker thread could not be created for the job.
    #[error("pool {pool:?} failed to spawn a worker: {error}")]
    SpawnFailed {
        /// Pool display name.
        pool: String,
        /// The underlying I/O error message.
        error: String,
    },

    /// A periodic task was scheduled with a zero period or delay.
    #[error("pool {pool:?} cannot schedule a periodic task with a zero period")]
    InvalidPeriod {
        /// Pool display name.
        pool: String,
    },
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::Rejected { .. } => "submit_rejected",
            SubmitError::ShutDown { .. } => "submit_shut_down",
            SubmitError::SpawnFailed { .. } => "submit_spawn_failed",
            SubmitError::InvalidPeriod { .. } => "submit_invalid_period",
        }
    }
}

/// # A submitted job did not produce a value.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The job was discarded, interrupted, or panicked before completing.
    #[error("job abandoned before completion")]
    Abandoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_failed_lists_primary_first() {
        let err = LifecycleError::ShutdownFailed {
            primary: StopFailure {
                resource: "c".into(),
                error: ResourceError::failed("c broke"),
            },
            suppressed: vec![StopFailure {
                resource: "a".into(),
                error: ResourceError::failed("a broke"),
            }],
        };

        let names: Vec<_> = err
            .stop_failures()
            .iter()
            .map(|f| f.resource.as_str())
            .collect();
        assert_eq!(names, vec!["c", "a"]);
        assert!(err.to_string().starts_with("2 resource(s) failed to stop"));
        assert_eq!(err.as_label(), "lifecycle_shutdown_failed");
    }

    #[test]
    fn config_error_messages() {
        let err = ConfigError::InvalidThreadBounds { min: 4, max: 2 };
        assert_eq!(
            err.to_string(),
            "min_threads (4) must not exceed max_threads (2)"
        );
        assert_eq!(err.as_label(), "config_invalid_thread_bounds");
    }
}
