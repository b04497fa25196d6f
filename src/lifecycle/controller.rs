//! Lifecycle controller.
//!
//! Drives the process through its states and decides how it ends:
//!
//! ```text
//! Validating ──fail──▶ Terminated (exit 1)
//!     │
//! Initializing ──fail──▶ Terminated (exit 1)
//!     │
//! Starting ──fail──▶ Terminated (exit 1)
//!     │           ──signal──▶ Terminated (exit 0, nothing to stop)
//!     │
//! Running ──fault──▶ Terminated (exit 1)
//!     │ signal / transport closed
//! ShuttingDown ──stop() ok, failed or timed out──▶ Terminated (exit 0)
//! ```
//!
//! A fault reported at any point before shutdown aborts the current stage. So
//! does a stop signal during boot, without calling `stop()`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::watch;

use crate::config::{LifecycleConfig, SessionDirectoryConfig};
use crate::lifecycle::exit::ExitOutcome;
use crate::lifecycle::faults::{Fault, FaultListener};
use crate::lifecycle::signals::{SignalSource, StopSignal};
use crate::lifecycle::state::{Lifecycle, LifecycleState, TransitionError};
use crate::observability::metrics;
use crate::preflight::{self, ValidatedSessionDir, ValidationFailure};
use crate::protocol::{server_metadata, ProtocolServer, ServerError, ServerMetadata};
use crate::resilience::timeouts::with_deadline;
use crate::service::{DomainService, ServiceError};

/// Every way the boot sequence or steady state can fail fatally.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("preflight validation failed: {0}")]
    Preflight(#[from] ValidationFailure),

    #[error("failed to initialize domain service: {0}")]
    Initialize(#[source] ServiceError),

    #[error("failed to start protocol server: {0}")]
    Start(#[source] ServerError),

    #[error("{stage} did not complete within {}s", timeout.as_secs_f64())]
    StageTimeout {
        stage: LifecycleState,
        timeout: Duration,
    },

    #[error("uncaught fault in {0}")]
    Fault(Fault),

    #[error("{stage} interrupted by {signal}")]
    Interrupted {
        stage: LifecycleState,
        signal: StopSignal,
    },

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Why the process left `Running` gracefully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Signal(StopSignal),
    TransportClosed,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Signal(signal) => write!(f, "received {}", signal),
            ShutdownReason::TransportClosed => f.write_str("client transport closed"),
        }
    }
}

/// Owns the lifecycle state and the exit decision for one process.
pub struct LifecycleController {
    config: LifecycleConfig,
    session: SessionDirectoryConfig,
    lifecycle: Lifecycle,
    faults: FaultListener,
}

impl LifecycleController {
    pub fn new(
        config: LifecycleConfig,
        session: SessionDirectoryConfig,
        faults: FaultListener,
    ) -> Self {
        Self {
            config,
            session,
            lifecycle: Lifecycle::new(),
            faults,
        }
    }

    /// Observe state changes from another task.
    pub fn state(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle.subscribe()
    }

    /// Boot, run until told to stop, and report how the process should exit.
    ///
    /// `make_service` receives the validated session directory; `make_server`
    /// is only called once the service has initialized.
    pub async fn run<D, S, MS, MP, G>(
        mut self,
        make_service: MS,
        make_server: MP,
        mut signals: G,
    ) -> ExitOutcome
    where
        D: DomainService,
        S: ProtocolServer,
        MS: FnOnce(ValidatedSessionDir) -> D + Send + 'static,
        MP: FnOnce(Arc<D>, ServerMetadata) -> S + Send + 'static,
        G: SignalSource,
    {
        let booted = Instant::now();
        let server = match self.boot(make_service, make_server, &mut signals).await {
            Ok(server) => server,
            Err(LifecycleError::Interrupted { stage, signal }) => {
                return self.abandon_boot(stage, signal)
            }
            Err(e) => return self.fail(e),
        };

        metrics::record_stage_duration("boot", booted);
        tracing::info!(
            server = server.metadata().name(),
            version = server.metadata().version(),
            boot_ms = booted.elapsed().as_millis() as u64,
            "Server running"
        );

        let reason = tokio::select! {
            signal = signals.recv() => ShutdownReason::Signal(signal),
            _ = server.closed() => ShutdownReason::TransportClosed,
            fault = self.faults.recv() => return self.fail(LifecycleError::Fault(fault)),
        };

        self.shutdown(&server, reason, &mut signals).await
    }

    async fn boot<D, S, MS, MP, G>(
        &mut self,
        make_service: MS,
        make_server: MP,
        signals: &mut G,
    ) -> Result<S, LifecycleError>
    where
        D: DomainService,
        S: ProtocolServer,
        MS: FnOnce(ValidatedSessionDir) -> D,
        MP: FnOnce(Arc<D>, ServerMetadata) -> S,
        G: SignalSource,
    {
        tracing::info!("Validating session directory");
        let session = self.session.clone();
        let session_dir = self
            .stage(LifecycleState::Validating, signals, async {
                preflight::validate(session).await.map_err(LifecycleError::from)
            })
            .await?;

        self.lifecycle.advance(LifecycleState::Initializing)?;
        let service = Arc::new(make_service(session_dir));
        self.stage(LifecycleState::Initializing, signals, async {
            service
                .initialize_without_cluster()
                .await
                .map_err(LifecycleError::Initialize)
        })
        .await?;
        tracing::info!("Domain service initialized");

        self.lifecycle.advance(LifecycleState::Starting)?;
        let server = make_server(Arc::clone(&service), server_metadata());
        self.stage(LifecycleState::Starting, signals, async {
            server.start().await.map_err(LifecycleError::Start)
        })
        .await?;

        self.lifecycle.advance(LifecycleState::Running)?;
        Ok(server)
    }

    /// Await one boot stage, racing it against faults, stop signals and the
    /// optional deadline.
    async fn stage<T, F, G>(
        &mut self,
        stage: LifecycleState,
        signals: &mut G,
        fut: F,
    ) -> Result<T, LifecycleError>
    where
        F: Future<Output = Result<T, LifecycleError>>,
        G: SignalSource,
    {
        let started = Instant::now();
        let deadline = self.config.stage_timeout();

        let result = tokio::select! {
            result = with_deadline(deadline, fut) => match result {
                Ok(inner) => inner,
                Err(exceeded) => Err(LifecycleError::StageTimeout { stage, timeout: exceeded.0 }),
            },
            fault = self.faults.recv() => Err(LifecycleError::Fault(fault)),
            signal = signals.recv() => Err(LifecycleError::Interrupted { stage, signal }),
        };

        metrics::record_stage_duration(stage.as_str(), started);
        result
    }

    async fn shutdown<S, G>(
        mut self,
        server: &S,
        reason: ShutdownReason,
        signals: &mut G,
    ) -> ExitOutcome
    where
        S: ProtocolServer,
        G: SignalSource,
    {
        if let Err(e) = self.lifecycle.advance(LifecycleState::ShuttingDown) {
            tracing::warn!(error = %e, "Unexpected state at shutdown");
        }
        tracing::info!(reason = %reason, "Shutting down");

        let timeout = self.config.shutdown_timeout();
        tokio::select! {
            result = tokio::time::timeout(timeout, server.stop()) => match result {
                Ok(Ok(())) => tracing::info!("Protocol server stopped"),
                Ok(Err(e)) => tracing::warn!(
                    error = %e,
                    "Protocol server failed to stop cleanly; exiting anyway"
                ),
                Err(_) => tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Protocol server did not stop in time; exiting anyway"
                ),
            },
            signal = signals.recv() => {
                tracing::warn!(
                    signal = %signal,
                    "Second stop signal; abandoning graceful shutdown"
                );
            }
        }

        self.lifecycle.terminate();
        ExitOutcome::graceful(format!("Shutdown complete ({})", reason))
    }

    /// Nothing has been started yet, so there is nothing to stop.
    fn abandon_boot(&mut self, stage: LifecycleState, signal: StopSignal) -> ExitOutcome {
        tracing::warn!(
            stage = %stage,
            signal = %signal,
            "Stop signal before the server was running; abandoning boot"
        );
        self.lifecycle.terminate();
        ExitOutcome::graceful(format!(
            "Boot abandoned while {} ({})",
            stage,
            ShutdownReason::Signal(signal)
        ))
    }

    fn fail(&mut self, error: LifecycleError) -> ExitOutcome {
        let stage = self.lifecycle.current();
        if let LifecycleError::Preflight(failure) = &error {
            tracing::error!(
                stage = %stage,
                error = %error,
                hint = %failure.hint(),
                "Preflight check failed"
            );
        } else {
            tracing::error!(stage = %stage, error = %error, "Fatal error");
        }
        self.lifecycle.terminate();
        ExitOutcome::fatal(format!("Fatal error while {}: {}", stage, error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_cause() {
        let err = LifecycleError::Initialize(ServiceError::Other("bad credentials".into()));
        assert_eq!(
            err.to_string(),
            "failed to initialize domain service: bad credentials"
        );

        let err = LifecycleError::StageTimeout {
            stage: LifecycleState::Starting,
            timeout: Duration::from_secs(3),
        };
        assert_eq!(err.to_string(), "starting did not complete within 3s");

        let err = LifecycleError::Interrupted {
            stage: LifecycleState::Initializing,
            signal: StopSignal::Interrupt,
        };
        assert_eq!(err.to_string(), "initializing interrupted by SIGINT");
    }

    #[test]
    fn test_shutdown_reason_display() {
        assert_eq!(
            ShutdownReason::Signal(StopSignal::Terminate).to_string(),
            "received SIGTERM"
        );
        assert_eq!(
            ShutdownReason::TransportClosed.to_string(),
            "client transport closed"
        );
    }
}
