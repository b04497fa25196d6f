//! Last-resort failure reporting.
//!
//! Panics and failed background tasks end up here instead of exiting the
//! process themselves. The controller is the only consumer; it turns a fault
//! into exit code 1. Anything arriving here is a gap in explicit error
//! handling and should be fixed at its source.

use std::fmt;
use std::future::Future;
use std::sync::Once;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

static PANIC_HOOK: Once = Once::new();

/// An error nothing else handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub origin: String,
    pub message: String,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.origin, self.message)
    }
}

/// Create a connected reporter/listener pair.
pub fn fault_channel() -> (FaultReporter, FaultListener) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FaultReporter { tx }, FaultListener { rx })
}

/// Sending half, cloned into anything that may fail out of band.
#[derive(Clone)]
pub struct FaultReporter {
    tx: mpsc::UnboundedSender<Fault>,
}

impl FaultReporter {
    pub fn report(&self, origin: impl Into<String>, message: impl Into<String>) {
        let fault = Fault {
            origin: origin.into(),
            message: message.into(),
        };
        tracing::error!(origin = %fault.origin, error = %fault.message, "Uncaught fault");
        let _ = self.tx.send(fault);
    }

    /// Route panics from any thread to this reporter. Only the first call installs a hook.
    pub fn install_panic_hook(&self) {
        let reporter = self.clone();
        PANIC_HOOK.call_once(move || {
            std::panic::set_hook(Box::new(move |info| {
                reporter.report("panic", info.to_string());
            }));
        });
    }

    /// Spawn `fut`, reporting an `Err` result or a panic as a fault.
    pub fn supervise<F, E>(&self, name: &'static str, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let reporter = self.clone();
        let inner = tokio::spawn(fut);
        tokio::spawn(async move {
            match inner.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => reporter.report(name, e.to_string()),
                Err(e) if e.is_panic() => reporter.report(name, format!("task panicked: {}", e)),
                Err(e) => tracing::debug!(task = name, error = %e, "Supervised task cancelled"),
            }
        })
    }
}

/// Receiving half, owned by the lifecycle controller.
pub struct FaultListener {
    rx: mpsc::UnboundedReceiver<Fault>,
}

impl FaultListener {
    /// Wait for the next fault. Never resolves once every reporter is gone.
    pub async fn recv(&mut self) -> Fault {
        match self.rx.recv().await {
            Some(fault) => fault,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_report_reaches_listener() {
        let (reporter, mut listener) = fault_channel();
        reporter.report("worker", "boom");
        let fault = listener.recv().await;
        assert_eq!(fault.origin, "worker");
        assert_eq!(fault.to_string(), "worker: boom");
    }

    #[tokio::test]
    async fn test_supervised_error_is_reported() {
        let (reporter, mut listener) = fault_channel();
        reporter
            .supervise("reader", async { Err::<(), _>("stream reset") })
            .await
            .unwrap();
        assert_eq!(listener.recv().await.message, "stream reset");
    }

    #[tokio::test]
    async fn test_supervised_success_is_silent() {
        let (reporter, mut listener) = fault_channel();
        reporter
            .supervise("reader", async { Ok::<(), String>(()) })
            .await
            .unwrap();
        let waited = tokio::time::timeout(Duration::from_millis(50), listener.recv()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_listener_pends_without_reporters() {
        let (reporter, mut listener) = fault_channel();
        drop(reporter);
        let waited = tokio::time::timeout(Duration::from_millis(50), listener.recv()).await;
        assert!(waited.is_err());
    }
}
