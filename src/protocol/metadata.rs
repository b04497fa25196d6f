//! Server identity reported to connecting clients.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("server metadata {0} must not be empty")]
    Empty(&'static str),
}

/// Immutable descriptor attached to the protocol server at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerMetadata {
    name: String,
    version: String,
    description: String,
    author: String,
}

impl ServerMetadata {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
        author: impl Into<String>,
    ) -> Result<Self, MetadataError> {
        let name = name.into();
        let version = version.into();
        if name.trim().is_empty() {
            return Err(MetadataError::Empty("name"));
        }
        if version.trim().is_empty() {
            return Err(MetadataError::Empty("version"));
        }
        Ok(Self {
            name,
            version,
            description: description.into(),
            author: author.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn author(&self) -> &str {
        &self.author
    }
}

/// The fixed identity of this server.
pub fn server_metadata() -> ServerMetadata {
    ServerMetadata {
        name: "dot-ai".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "AI-powered Kubernetes deployment agent: discovers cluster capabilities and \
                      recommends, configures and deploys applications"
            .to_string(),
        author: "Viktor Farcic".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_metadata() {
        let metadata = server_metadata();
        assert_eq!(metadata.name(), "dot-ai");
        assert_eq!(metadata.version(), env!("CARGO_PKG_VERSION"));
        assert!(!metadata.description().is_empty());
        assert!(!metadata.author().is_empty());
    }

    #[test]
    fn test_rejects_empty_name_and_version() {
        assert_eq!(
            ServerMetadata::new("", "1.0.0", "d", "a"),
            Err(MetadataError::Empty("name"))
        );
        assert_eq!(
            ServerMetadata::new("x", " ", "d", "a"),
            Err(MetadataError::Empty("version"))
        );
        assert!(ServerMetadata::new("x", "1.0.0", "", "").is_ok());
    }
}
