//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, stderr only)
//!     → metrics.rs (lifecycle gauge, stage timings, exit counter)
//!
//! Consumers:
//!     → Operator terminal or log collector reading stderr
//!     → Metrics endpoint (Prometheus scrape, opt-in)
//! ```
//!
//! # Design Decisions
//! - stdout belongs to the protocol; nothing here may write to it
//! - Metrics calls are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
