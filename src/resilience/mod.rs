//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Boot stage (preflight, initialize, start):
//!     → timeouts.rs (optional deadline)
//! Shutdown:
//!     → timeouts.rs (bounded wait for stop())
//! ```
//!
//! # Design Decisions
//! - No automatic retries; a failed stage is fatal and the operator re-runs
//! - Boot stage deadlines are opt-in, shutdown always has one

pub mod timeouts;
