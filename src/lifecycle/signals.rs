//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT and SIGTERM handlers once, at startup
//! - Translate both into the same stop request
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A second signal during shutdown abandons the graceful stop

use std::fmt;
use std::io;

use async_trait::async_trait;
use tokio::sync::mpsc;

/// A request to stop the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopSignal::Interrupt => f.write_str("SIGINT"),
            StopSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Anything the controller can wait on for stop requests.
#[async_trait]
pub trait SignalSource: Send {
    async fn recv(&mut self) -> StopSignal;
}

/// Stop requests from the operating system.
pub struct SignalListener {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalListener {
    /// Register the handlers. Signals arriving after this are never lost.
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }
}

#[cfg(not(unix))]
impl SignalListener {
    pub fn install() -> io::Result<Self> {
        Ok(Self {})
    }
}

#[cfg(unix)]
#[async_trait]
impl SignalSource for SignalListener {
    async fn recv(&mut self) -> StopSignal {
        tokio::select! {
            _ = self.interrupt.recv() => StopSignal::Interrupt,
            _ = self.terminate.recv() => StopSignal::Terminate,
        }
    }
}

#[cfg(not(unix))]
#[async_trait]
impl SignalSource for SignalListener {
    async fn recv(&mut self) -> StopSignal {
        match tokio::signal::ctrl_c().await {
            Ok(()) => StopSignal::Interrupt,
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending().await
            }
        }
    }
}

/// In-process stop requests, for embedding and tests.
#[async_trait]
impl SignalSource for mpsc::UnboundedReceiver<StopSignal> {
    async fn recv(&mut self) -> StopSignal {
        match mpsc::UnboundedReceiver::recv(self).await {
            Some(signal) => signal,
            None => std::future::pending().await,
        }
    }
}
