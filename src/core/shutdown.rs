//! # Cross-platform OS signal handling.
//!
//! Provides [`ShutdownSignals`] (installed listeners that can be awaited repeatedly) and
//! [`wait_for_shutdown_signal`], a one-shot helper.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for core dumps or hard stop)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use std::fmt;

/// Which signal ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// `SIGINT` or Ctrl-C.
    Interrupt,
    /// `SIGTERM`.
    Terminate,
    /// `SIGQUIT`.
    Quit,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShutdownSignal::Interrupt => "SIGINT",
            ShutdownSignal::Terminate => "SIGTERM",
            ShutdownSignal::Quit => "SIGQUIT",
        })
    }
}

/// Installed termination-signal listeners.
///
/// Listeners stay registered for the lifetime of the value, so a second signal
/// arriving while the first is handled is not lost.
#[cfg(unix)]
pub struct ShutdownSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
    sigquit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// Registers the listeners. Fails if signal registration fails.
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
            sigquit: signal(SignalKind::quit())?,
        })
    }

    /// Waits for the next termination signal.
    pub async fn recv(&mut self) -> ShutdownSignal {
        tokio::select! {
            _ = self.sigint.recv()  => ShutdownSignal::Interrupt,
            _ = self.sigterm.recv() => ShutdownSignal::Terminate,
            _ = self.sigquit.recv() => ShutdownSignal::Quit,
        }
    }
}

/// Installed termination-signal listeners.
#[cfg(not(unix))]
pub struct ShutdownSignals {
    _private: (),
}

#[cfg(not(unix))]
impl ShutdownSignals {
    /// Registers the listeners.
    pub fn install() -> std::io::Result<Self> {
        Ok(Self { _private: () })
    }

    /// Waits for the next Ctrl-C.
    pub async fn recv(&mut self) -> ShutdownSignal {
        let _ = tokio::signal::ctrl_c().await;
        ShutdownSignal::Interrupt
    }
}

/// Waits for a single termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns the signal received, or `Err` if signal registration fails.
pub async fn wait_for_shutdown_signal() -> std::io::Result<ShutdownSignal> {
    let mut signals = ShutdownSignals::install()?;
    Ok(signals.recv().await)
}
