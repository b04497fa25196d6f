//! Protocol server boundary.
//!
//! # Data Flow
//! ```text
//! client (stdin, one JSON-RPC message per line)
//!     → stdio.rs (parse, answer lifecycle methods)
//!     → client (stdout, one response per line)
//! ```
//!
//! # Design Decisions
//! - stdout carries protocol traffic only; diagnostics go to stderr
//! - `stop()` is idempotent and safe before `start()` completes
//! - Transport end (EOF) is surfaced through `closed()`, not as an error

pub mod metadata;
pub mod stdio;

use async_trait::async_trait;
use thiserror::Error;

pub use metadata::{server_metadata, MetadataError, ServerMetadata};
pub use stdio::StdioServer;

/// Errors raised by the protocol server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server already started")]
    AlreadyStarted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Task(String),

    #[error("{0}")]
    Other(String),
}

/// Lifecycle facade over the protocol server.
#[async_trait]
pub trait ProtocolServer: Send + Sync + 'static {
    fn metadata(&self) -> &ServerMetadata;

    /// Begin accepting protocol sessions.
    async fn start(&self) -> Result<(), ServerError>;

    /// Stop accepting sessions and release resources.
    async fn stop(&self) -> Result<(), ServerError>;

    /// Resolves once the transport has ended on its own.
    async fn closed(&self) {
        std::future::pending::<()>().await
    }
}
