//! Process lifecycle state machine.

use std::fmt;

use thiserror::Error;
use tokio::sync::watch;

use crate::observability::metrics;

/// Where the process is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Validating,
    Initializing,
    Starting,
    Running,
    ShuttingDown,
    Terminated,
}

impl LifecycleState {
    /// The only state this one may advance to, besides `Terminated`.
    pub fn successor(self) -> Option<Self> {
        match self {
            LifecycleState::Validating => Some(LifecycleState::Initializing),
            LifecycleState::Initializing => Some(LifecycleState::Starting),
            LifecycleState::Starting => Some(LifecycleState::Running),
            LifecycleState::Running => Some(LifecycleState::ShuttingDown),
            LifecycleState::ShuttingDown => Some(LifecycleState::Terminated),
            LifecycleState::Terminated => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Validating => "validating",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::ShuttingDown => "shutting_down",
            LifecycleState::Terminated => "terminated",
        }
    }

    /// Position in the forward order; used as the gauge value.
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid lifecycle transition from {from} to {to}")]
pub struct TransitionError {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

/// The single owned lifecycle value of a controller.
///
/// Changes are published on a watch channel so other tasks can observe the
/// current state without being able to change it.
pub struct Lifecycle {
    tx: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(LifecycleState::Validating);
        metrics::record_state(LifecycleState::Validating);
        Self { tx }
    }

    pub fn current(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    /// Move to `to`, which must be the successor of the current state or `Terminated`.
    pub fn advance(&mut self, to: LifecycleState) -> Result<(), TransitionError> {
        let from = self.current();
        if from == LifecycleState::Terminated && to == LifecycleState::Terminated {
            return Ok(());
        }
        if to != LifecycleState::Terminated && from.successor() != Some(to) {
            return Err(TransitionError { from, to });
        }

        tracing::debug!(from = %from, to = %to, "Lifecycle transition");
        self.tx.send_replace(to);
        metrics::record_state(to);
        Ok(())
    }

    /// Enter `Terminated` from wherever we are.
    pub fn terminate(&mut self) {
        // Terminated is reachable from every state.
        let _ = self.advance(LifecycleState::Terminated);
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.current(), LifecycleState::Validating);

        for next in [
            LifecycleState::Initializing,
            LifecycleState::Starting,
            LifecycleState::Running,
            LifecycleState::ShuttingDown,
            LifecycleState::Terminated,
        ] {
            lifecycle.advance(next).unwrap();
            assert_eq!(lifecycle.current(), next);
        }
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        let mut lifecycle = Lifecycle::new();
        let err = lifecycle.advance(LifecycleState::Running).unwrap_err();
        assert_eq!(err.from, LifecycleState::Validating);
        assert_eq!(err.to, LifecycleState::Running);

        lifecycle.advance(LifecycleState::Initializing).unwrap();
        assert!(lifecycle.advance(LifecycleState::Validating).is_err());
        assert!(lifecycle.advance(LifecycleState::Initializing).is_err());
    }

    #[test]
    fn test_terminated_from_any_state_and_absorbing() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(LifecycleState::Initializing).unwrap();
        lifecycle.terminate();
        assert_eq!(lifecycle.current(), LifecycleState::Terminated);

        lifecycle.terminate();
        assert!(lifecycle.advance(LifecycleState::Running).is_err());
        assert_eq!(lifecycle.current(), LifecycleState::Terminated);
    }

    #[test]
    fn test_subscribers_see_changes() {
        let mut lifecycle = Lifecycle::new();
        let rx = lifecycle.subscribe();
        lifecycle.advance(LifecycleState::Initializing).unwrap();
        assert_eq!(*rx.borrow(), LifecycleState::Initializing);
    }

    #[test]
    fn test_ordinals_follow_order() {
        assert_eq!(LifecycleState::Validating.ordinal(), 0);
        assert_eq!(LifecycleState::Terminated.ordinal(), 5);
        assert_eq!(LifecycleState::ShuttingDown.to_string(), "shutting_down");
    }
}
