//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Boot (controller.rs):
//!     Preflight → Initialize domain service → Start protocol server → Running
//!
//! Shutdown (controller.rs, shutdown.rs):
//!     Signal or transport closed → stop() → exit 0
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown
//!
//! Faults (faults.rs):
//!     panic or failed background task → exit 1
//! ```
//!
//! # Design Decisions
//! - Strictly ordered boot; no stage overlaps another
//! - Shutdown has timeout: process exits after the deadline regardless
//! - Only `ExitOutcome::terminate` ends the process

pub mod controller;
pub mod exit;
pub mod faults;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use controller::{LifecycleController, LifecycleError, ShutdownReason};
pub use exit::ExitOutcome;
pub use faults::{fault_channel, Fault, FaultListener, FaultReporter};
pub use shutdown::{Shutdown, ShutdownNotice};
pub use signals::{SignalListener, SignalSource, StopSignal};
pub use state::{Lifecycle, LifecycleState, TransitionError};
