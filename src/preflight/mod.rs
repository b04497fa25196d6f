//! Preflight validation.
//!
//! Runs before any stateful work. The only check today is the session
//! directory; each failure is terminal for the process.
//!
//! ```text
//! DOT_AI_SESSION_DIR
//!     → set and non-empty?       else MissingConfig
//!     → exists?                  else PathNotFound
//!     → is a directory?          else NotADirectory
//!     → probe create + delete?   else NotWritable
//!     → ValidatedSessionDir
//! ```

pub mod session_dir;

pub use session_dir::{validate, validate_blocking, ValidatedSessionDir, ValidationFailure};
