//! Error types for deployment orchestration

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::inputs::InputKind;

/// Result type alias for orchestration operations
pub type Result<T> = std::result::Result<T, NirvanaError>;

/// Errors that can stop a deployment run
///
/// Failures with a defined fallback (values fetch, values parsing, diff exit
/// codes) never surface here.
#[derive(Debug, Error)]
pub enum NirvanaError {
    /// A subprocess could not be started at all
    #[error("Failed to launch `{command}`: {source}")]
    Launch {
        /// Command line that was being launched
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// `helm dependency update` exited non-zero
    #[error("Helm dependency update failed:\n{stderr}")]
    DependencyUpdateFailed {
        /// Captured stderr of the dependency update
        stderr: String,
    },

    /// There was nothing to choose from for an input
    #[error("No {input} candidates found{}", format_detail(.detail))]
    NoCandidates {
        input: InputKind,
        /// Extra context, e.g. stderr of the listing command
        detail: String,
    },

    /// A resolved input ended up empty
    #[error("{0} must not be empty")]
    EmptyInput(InputKind),

    /// The operator cancelled an interactive selection
    #[error("Selection cancelled")]
    Cancelled,

    /// Reading the deployment directory tree failed
    #[error("Failed to read {}: {source}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required executable is not available
    #[error("Required tool `{0}` was not found. Is it installed and on PATH?")]
    MissingTool(String),

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Terminal interaction failed
    #[error("Terminal I/O failed: {0}")]
    Console(#[source] std::io::Error),
}

fn format_detail(detail: &str) -> String {
    if detail.trim().is_empty() {
        String::new()
    } else {
        format!(": {}", detail.trim())
    }
}

impl NirvanaError {
    /// Create a launch error for the given command line
    pub fn launch(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Launch {
            command: command.into(),
            source,
        }
    }

    /// Create a "no candidates" error without extra detail
    pub fn no_candidates(input: InputKind) -> Self {
        Self::NoCandidates {
            input,
            detail: String::new(),
        }
    }

    /// Check if this error is a deliberate stop by the operator
    pub fn is_user_abort(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
