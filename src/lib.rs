//! dot-ai protocol server.
//!
//! Boots a deployment-automation agent behind a JSON-RPC stdio server and
//! owns the process lifecycle around it.
//!
//! ```text
//! ┌──────────────────────────── dot-ai-server ─────────────────────────────┐
//! │                                                                        │
//! │  lifecycle::controller                                                 │
//! │     │                                                                  │
//! │     ├─▶ preflight (DOT_AI_SESSION_DIR)                                 │
//! │     ├─▶ service::DomainService::initialize_without_cluster            │
//! │     ├─▶ protocol::ProtocolServer::start ◀──── stdin/stdout ──── client │
//! │     └─▶ protocol::ProtocolServer::stop  ◀──── SIGINT/SIGTERM          │
//! │                                                                        │
//! │  config · observability · resilience                                   │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```

// Lifecycle core
pub mod lifecycle;
pub mod preflight;

// Boundaries
pub mod protocol;
pub mod service;

// Cross-cutting concerns
pub mod config;
pub mod observability;
pub mod resilience;

pub use config::schema::ServerConfig;
pub use lifecycle::{ExitOutcome, LifecycleController, LifecycleState};
