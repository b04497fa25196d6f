//! Domain service boundary.
//!
//! The lifecycle controller only needs to know how to bring the service up
//! offline. Everything else the deployment agent does happens behind the
//! protocol server, on demand.

pub mod agent;

use async_trait::async_trait;
use thiserror::Error;

pub use agent::{ClusterTarget, DeploymentAgent};

/// Errors raised by the domain service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("service not initialized")]
    NotInitialized,

    #[error("cluster unavailable: {0}")]
    ClusterUnavailable(String),

    #[error("{0}")]
    Other(String),
}

/// Lifecycle facade over the domain service.
#[async_trait]
pub trait DomainService: Send + Sync + 'static {
    /// Local setup only. Must not require the cluster to be reachable.
    async fn initialize_without_cluster(&self) -> Result<(), ServiceError>;
}
