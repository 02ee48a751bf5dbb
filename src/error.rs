//! Error types for aether.
//!
//! One crate-wide error enum, derived with thiserror. Each variant belongs to a
//! category of the failure taxonomy and maps to an exit code for the CLI.
//! User-facing replies are never built from these messages directly; see
//! `orchestrator::narration`.

use crate::exit_codes;
use crate::llm::LlmError;
use thiserror::Error;

/// Main error type for aether operations.
#[derive(Error, Debug)]
pub enum AetherError {
    /// Missing, placeholder, or rejected configuration. Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The planner could not produce a usable plan.
    #[error("planning failed: {0}")]
    Planning(String),

    /// A task attempt failed. Local to one task.
    #[error("task execution failed: {0}")]
    Execution(String),

    /// A task branch could not be merged cleanly.
    #[error("merge conflict on branch '{branch}': {detail}")]
    MergeConflict { branch: String, detail: String },

    /// The text-generation endpoint failed.
    #[error("text generation failed: {0}")]
    Transport(#[from] LlmError),

    /// Git operation failed.
    #[error("Git operation failed: {0}")]
    Git(String),

    /// Mission, task, agent, or conversation records could not be persisted.
    #[error("store operation failed: {0}")]
    Store(String),

    /// An audit trail record could not be written.
    #[error("audit trail write failed: {0}")]
    Audit(String),

    /// A lifecycle transition was requested from the wrong state.
    #[error("invalid state transition: {0}")]
    State(String),

    /// User provided invalid arguments or referenced something unknown.
    #[error("{0}")]
    UserError(String),
}

impl AetherError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            AetherError::Configuration(_) => exit_codes::CONFIGURATION_ERROR,
            AetherError::Transport(e) if e.is_configuration() => exit_codes::CONFIGURATION_ERROR,
            AetherError::Planning(_)
            | AetherError::Execution(_)
            | AetherError::MergeConflict { .. }
            | AetherError::Transport(_)
            | AetherError::State(_) => exit_codes::MISSION_FAILURE,
            AetherError::Git(_) => exit_codes::GIT_FAILURE,
            AetherError::Store(_) | AetherError::Audit(_) => exit_codes::STORAGE_FAILURE,
            AetherError::UserError(_) => exit_codes::USER_ERROR,
        }
    }

    /// Whether the failure points at configuration (bad or rejected credentials,
    /// unreachable endpoint settings) rather than at the work itself.
    pub fn is_configuration(&self) -> bool {
        match self {
            AetherError::Configuration(_) => true,
            AetherError::Transport(e) => e.is_configuration(),
            _ => false,
        }
    }

    /// Whether another attempt at the same task could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AetherError::Configuration(_) | AetherError::State(_) | AetherError::UserError(_) => {
                false
            }
            AetherError::Transport(e) => !e.is_configuration(),
            _ => true,
        }
    }
}

/// Result type alias for aether operations.
pub type Result<T> = std::result::Result<T, AetherError>;
