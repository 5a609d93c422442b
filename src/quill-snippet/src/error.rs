//! Snippet engine error types.
//!
//! These cover failures of the host while preparing a run (VM creation,
//! capability installation). Failures of the snippet itself never surface
//! here; they are reported as `error` records in an `ExecutionResult`.

use thiserror::Error;

/// Host-side snippet engine errors.
#[derive(Error, Debug)]
pub enum SnippetError {
    /// The interpreter could not be created.
    #[error("Failed to create interpreter: {0}")]
    VmCreation(String),

    /// A capability could not be installed into the sandbox.
    #[error("Failed to install capability '{capability}': {message}")]
    CapabilityInstall { capability: String, message: String },

    /// The blocking task running a snippet did not complete.
    #[error("Snippet task failed: {0}")]
    TaskFailed(String),
}

impl SnippetError {
    /// Create a capability installation error.
    pub fn capability_install(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CapabilityInstall {
            capability: capability.into(),
            message: message.into(),
        }
    }
}

impl From<mlua::Error> for SnippetError {
    fn from(err: mlua::Error) -> Self {
        Self::VmCreation(err.to_string())
    }
}

/// Result type for snippet engine operations.
pub type Result<T> = std::result::Result<T, SnippetError>;
