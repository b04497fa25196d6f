//! Stop notice for the protocol transport.

use tokio::sync::watch;

/// Latched stop request.
///
/// Once triggered it stays triggered, so a loop that subscribes after the
/// trigger still observes it.
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShutdownNotice {
        ShutdownNotice {
            rx: self.tx.subscribe(),
        }
    }

    /// Request the stop. Returns false if it had already been requested.
    pub fn trigger(&self) -> bool {
        !self.tx.send_replace(true)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side held by a transport loop.
pub struct ShutdownNotice {
    rx: watch::Receiver<bool>,
}

impl ShutdownNotice {
    /// Resolves once a stop has been requested. Pends forever if the
    /// coordinator is dropped without triggering.
    pub async fn requested(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_is_latched() {
        let shutdown = Shutdown::new();
        assert!(shutdown.trigger());
        assert!(!shutdown.trigger());

        let mut late = shutdown.subscribe();
        tokio::time::timeout(Duration::from_secs(1), late.requested())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_coordinator_never_requests() {
        let shutdown = Shutdown::new();
        let mut notice = shutdown.subscribe();
        drop(shutdown);
        let waited = tokio::time::timeout(Duration::from_millis(50), notice.requested()).await;
        assert!(waited.is_err());
    }
}
