//! Deployment agent service.
//!
//! Boot only records where things live. The cluster target is resolved the
//! first time a request handler asks for it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{DomainService, ServiceError};
use crate::preflight::ValidatedSessionDir;

/// Where the agent will find its cluster credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterTarget {
    pub kubeconfig: PathBuf,
}

pub struct DeploymentAgent {
    session_dir: ValidatedSessionDir,
    kubeconfig: Option<PathBuf>,
    initialized: AtomicBool,
    cluster: OnceCell<ClusterTarget>,
}

impl DeploymentAgent {
    /// Build an agent using `KUBECONFIG` or `$HOME/.kube/config`.
    pub fn new(session_dir: ValidatedSessionDir) -> Self {
        let kubeconfig = std::env::var_os("KUBECONFIG")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".kube/config")));
        Self::with_kubeconfig(session_dir, kubeconfig)
    }

    pub fn with_kubeconfig(session_dir: ValidatedSessionDir, kubeconfig: Option<PathBuf>) -> Self {
        Self {
            session_dir,
            kubeconfig,
            initialized: AtomicBool::new(false),
            cluster: OnceCell::new(),
        }
    }

    pub fn session_dir(&self) -> &Path {
        self.session_dir.path()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Resolve the cluster target on first use and cache it.
    pub async fn cluster_target(&self) -> Result<&ClusterTarget, ServiceError> {
        if !self.is_initialized() {
            return Err(ServiceError::NotInitialized);
        }
        self.cluster
            .get_or_try_init(|| async {
                let kubeconfig = self.kubeconfig.clone().ok_or_else(|| {
                    ServiceError::ClusterUnavailable("no kubeconfig location known".into())
                })?;
                if !tokio::fs::try_exists(&kubeconfig).await? {
                    return Err(ServiceError::ClusterUnavailable(format!(
                        "kubeconfig not found at {}",
                        kubeconfig.display()
                    )));
                }
                tracing::info!(kubeconfig = %kubeconfig.display(), "Cluster target resolved");
                Ok::<_, ServiceError>(ClusterTarget { kubeconfig })
            })
            .await
    }
}

#[async_trait]
impl DomainService for DeploymentAgent {
    async fn initialize_without_cluster(&self) -> Result<(), ServiceError> {
        tracing::info!(
            session_dir = %self.session_dir().display(),
            kubeconfig = ?self.kubeconfig,
            "Deployment agent initialized without cluster connection"
        );
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionDirectoryConfig;
    use crate::preflight::validate_blocking;

    fn session_dir(tmp: &tempfile::TempDir) -> ValidatedSessionDir {
        validate_blocking(&SessionDirectoryConfig::from_path(tmp.path())).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_does_not_touch_cluster() {
        let tmp = tempfile::tempdir().unwrap();
        let agent = DeploymentAgent::with_kubeconfig(
            session_dir(&tmp),
            Some(tmp.path().join("missing-kubeconfig")),
        );

        agent.initialize_without_cluster().await.unwrap();
        assert!(agent.is_initialized());
    }

    #[tokio::test]
    async fn test_cluster_target_requires_initialize() {
        let tmp = tempfile::tempdir().unwrap();
        let agent = DeploymentAgent::with_kubeconfig(session_dir(&tmp), None);
        assert!(matches!(
            agent.cluster_target().await,
            Err(ServiceError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_cluster_target_is_lazy() {
        let tmp = tempfile::tempdir().unwrap();
        let kubeconfig = tmp.path().join("config");
        let agent = DeploymentAgent::with_kubeconfig(session_dir(&tmp), Some(kubeconfig.clone()));
        agent.initialize_without_cluster().await.unwrap();

        assert!(matches!(
            agent.cluster_target().await,
            Err(ServiceError::ClusterUnavailable(_))
        ));

        std::fs::write(&kubeconfig, b"apiVersion: v1").unwrap();
        let target = agent.cluster_target().await.unwrap();
        assert_eq!(target.kubeconfig, kubeconfig);
    }
}
