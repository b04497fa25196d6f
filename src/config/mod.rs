//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → handed to the lifecycle controller at boot
//!
//! DOT_AI_SESSION_DIR (environment)
//!     → schema.rs SessionDirectoryConfig
//!     → preflight (existence, type, writability)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults so the file is optional
//! - The session directory only ever comes from the environment

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::LifecycleConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::ServerConfig;
pub use schema::SessionDirectoryConfig;
pub use schema::SESSION_DIR_ENV;
