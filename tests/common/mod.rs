//! Shared harness for lifecycle integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dot_ai_server::config::{LifecycleConfig, SessionDirectoryConfig};
use dot_ai_server::lifecycle::{
    fault_channel, ExitOutcome, FaultReporter, LifecycleController, LifecycleState, StopSignal,
};
use dot_ai_server::protocol::{ProtocolServer, ServerError, ServerMetadata};
use dot_ai_server::service::{DomainService, ServiceError};
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;

/// How a scripted call behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Behavior {
    #[default]
    Succeed,
    Fail,
    Hang,
}

impl Behavior {
    async fn play<E>(self, error: impl FnOnce() -> E) -> Result<(), E> {
        match self {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(error()),
            Behavior::Hang => std::future::pending().await,
        }
    }
}

/// Call counters shared between the mocks and the test.
#[derive(Clone, Default)]
pub struct Probe {
    pub services_built: Arc<AtomicUsize>,
    pub initialized: Arc<AtomicUsize>,
    pub servers_built: Arc<AtomicUsize>,
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
}

impl Probe {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct MockService {
    probe: Probe,
    init: Behavior,
}

#[async_trait]
impl DomainService for MockService {
    async fn initialize_without_cluster(&self) -> Result<(), ServiceError> {
        self.probe.initialized.fetch_add(1, Ordering::SeqCst);
        self.init
            .play(|| ServiceError::Other("credentials rejected".into()))
            .await
    }
}

pub struct MockServer {
    probe: Probe,
    metadata: ServerMetadata,
    start: Behavior,
    stop: Behavior,
    closed: Arc<Notify>,
}

#[async_trait]
impl ProtocolServer for MockServer {
    fn metadata(&self) -> &ServerMetadata {
        &self.metadata
    }

    async fn start(&self) -> Result<(), ServerError> {
        self.probe.starts.fetch_add(1, Ordering::SeqCst);
        self.start
            .play(|| ServerError::Other("address in use".into()))
            .await
    }

    async fn stop(&self) -> Result<(), ServerError> {
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        self.stop
            .play(|| ServerError::Other("transport already gone".into()))
            .await
    }

    async fn closed(&self) {
        self.closed.notified().await
    }
}

#[derive(Default)]
pub struct Scenario {
    pub init: Behavior,
    pub start: Behavior,
    pub stop: Behavior,
    pub config: LifecycleConfig,
}

/// A controller running in the background with handles to drive it.
pub struct Harness {
    pub probe: Probe,
    pub signals: mpsc::UnboundedSender<StopSignal>,
    pub faults: FaultReporter,
    pub state: watch::Receiver<LifecycleState>,
    pub closed: Arc<Notify>,
    handle: JoinHandle<ExitOutcome>,
}

impl Harness {
    pub async fn wait_for(&mut self, state: LifecycleState) {
        tokio::time::timeout(Duration::from_secs(5), self.state.wait_for(|s| *s == state))
            .await
            .expect("state not reached in time")
            .expect("controller dropped");
    }

    pub fn signal(&self, signal: StopSignal) {
        self.signals.send(signal).unwrap();
    }

    pub async fn outcome(self) -> ExitOutcome {
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("controller did not finish")
            .expect("controller panicked")
    }
}

pub fn launch(session: SessionDirectoryConfig, scenario: Scenario) -> Harness {
    let probe = Probe::default();
    let (faults, listener) = fault_channel();
    let (signals, signal_rx) = mpsc::unbounded_channel();
    let closed = Arc::new(Notify::new());

    let controller = LifecycleController::new(scenario.config, session, listener);
    let state = controller.state();

    let service_probe = probe.clone();
    let server_probe = probe.clone();
    let server_closed = closed.clone();
    let handle = tokio::spawn(controller.run(
        move |_session_dir| {
            service_probe.services_built.fetch_add(1, Ordering::SeqCst);
            MockService {
                probe: service_probe,
                init: scenario.init,
            }
        },
        move |_service: Arc<MockService>, metadata| {
            server_probe.servers_built.fetch_add(1, Ordering::SeqCst);
            MockServer {
                probe: server_probe,
                metadata,
                start: scenario.start,
                stop: scenario.stop,
                closed: server_closed,
            }
        },
        signal_rx,
    ));

    Harness {
        probe,
        signals,
        faults,
        state,
        closed,
        handle,
    }
}
