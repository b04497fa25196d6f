//! Session directory checks.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::config::{SessionDirectoryConfig, SESSION_DIR_ENV};

/// Example value shown when the variable is missing.
const EXAMPLE_SESSION_DIR: &str = "/tmp/dot-ai-sessions";

/// Why the session directory cannot be used.
#[derive(Debug, Error)]
pub enum ValidationFailure {
    #[error("DOT_AI_SESSION_DIR environment variable is not set")]
    MissingConfig,

    #[error("session directory does not exist: {}", path.display())]
    PathNotFound { path: PathBuf },

    #[error("session directory path is not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("session directory is not writable: {} ({source})", path.display())]
    NotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ValidationFailure {
    /// Operator guidance printed after the failure itself.
    pub fn hint(&self) -> String {
        match self {
            ValidationFailure::MissingConfig => format!(
                "set {} to a directory for session state, e.g. {}={}; the directory must exist and be writable",
                SESSION_DIR_ENV, SESSION_DIR_ENV, EXAMPLE_SESSION_DIR
            ),
            ValidationFailure::PathNotFound { .. } => {
                format!("create the directory or point {} at an existing one", SESSION_DIR_ENV)
            }
            ValidationFailure::NotADirectory { .. } => {
                format!("{} must name a directory, not a file", SESSION_DIR_ENV)
            }
            ValidationFailure::NotWritable { .. } => {
                "grant this process permission to create and delete files in the directory"
                    .to_string()
            }
        }
    }
}

/// A session directory that passed every preflight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSessionDir(PathBuf);

impl ValidatedSessionDir {
    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn into_path(self) -> PathBuf {
        self.0
    }
}

/// Validate the session directory on the blocking pool.
pub async fn validate(
    config: SessionDirectoryConfig,
) -> Result<ValidatedSessionDir, ValidationFailure> {
    let fallback = config.path().unwrap_or_default();
    match tokio::task::spawn_blocking(move || validate_blocking(&config)).await {
        Ok(result) => result,
        Err(e) => Err(ValidationFailure::NotWritable {
            path: fallback,
            source: io::Error::other(e.to_string()),
        }),
    }
}

/// Run the four checks in order, stopping at the first failure.
pub fn validate_blocking(
    config: &SessionDirectoryConfig,
) -> Result<ValidatedSessionDir, ValidationFailure> {
    let Some(path) = config.path() else {
        tracing::error!(
            variable = SESSION_DIR_ENV,
            example = EXAMPLE_SESSION_DIR,
            "Session directory is not configured; it must exist and be writable"
        );
        return Err(ValidationFailure::MissingConfig);
    };

    tracing::debug!(path = %path.display(), "Validating session directory");

    // metadata() follows symlinks, so a dangling link counts as missing.
    let metadata = match fs::metadata(&path) {
        Ok(m) => m,
        Err(_) => return Err(ValidationFailure::PathNotFound { path }),
    };

    if !metadata.is_dir() {
        return Err(ValidationFailure::NotADirectory { path });
    }

    if let Err(source) = probe_writable(&path) {
        return Err(ValidationFailure::NotWritable { path, source });
    }

    tracing::info!(path = %path.display(), "Session directory validated");
    Ok(ValidatedSessionDir(path))
}

/// Create and delete a uniquely named file inside `dir`.
fn probe_writable(dir: &Path) -> io::Result<()> {
    let probe = dir.join(format!(".dot-ai-preflight-{}.tmp", Uuid::new_v4()));
    fs::write(&probe, b"preflight")?;
    fs::remove_file(&probe)
}
