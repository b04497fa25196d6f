//! Process exit policy.

use crate::observability::metrics;

/// How the process ends: a message for the operator and an exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitOutcome {
    message: String,
    code: i32,
}

impl ExitOutcome {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;

    /// Clean shutdown (exit code 0).
    pub fn graceful(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Self::SUCCESS,
        }
    }

    /// Any fatal condition (exit code 1).
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Self::FAILURE,
        }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_success(&self) -> bool {
        self.code == Self::SUCCESS
    }

    /// Report the outcome on the diagnostic stream and exit the process.
    ///
    /// This is the only place the process exits.
    pub fn terminate(self) -> ! {
        metrics::record_exit(self.code);
        if tracing::dispatcher::has_been_set() {
            if self.is_success() {
                tracing::info!(exit_code = self.code, "{}", self.message);
            } else {
                tracing::error!(exit_code = self.code, "{}", self.message);
            }
        } else {
            eprintln!("{} (exit code {})", self.message, self.code);
        }
        std::process::exit(self.code)
    }
}
