//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! File-backed types derive Serde traits for deserialization from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable naming the session state directory.
pub const SESSION_DIR_ENV: &str = "DOT_AI_SESSION_DIR";

/// Root configuration for the server process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Boot and shutdown timing.
    pub lifecycle: LifecycleConfig,
}

/// Output format of the diagnostic stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Diagnostic line format.
    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9464".to_string(),
        }
    }
}

/// Lifecycle timing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Upper bound on how long `stop()` may take before the process exits anyway.
    pub shutdown_timeout_secs: u64,

    /// Optional deadline for each boot stage. Unset means stages may suspend indefinitely.
    pub stage_timeout_secs: Option<u64>,
}

impl LifecycleConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_secs: 10,
            stage_timeout_secs: None,
        }
    }
}

/// The session directory setting as read from the environment.
///
/// Holds the raw value only; nothing here checks the filesystem. See
/// [`crate::preflight`] for that.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionDirectoryConfig {
    value: Option<String>,
}

impl SessionDirectoryConfig {
    /// Read [`SESSION_DIR_ENV`] from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the setting through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: FnOnce(&str) -> Option<String>,
    {
        Self {
            value: lookup(SESSION_DIR_ENV),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            value: Some(path.as_ref().to_string_lossy().into_owned()),
        }
    }

    /// The configured path, or `None` when unset or empty.
    pub fn path(&self) -> Option<PathBuf> {
        self.value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}
