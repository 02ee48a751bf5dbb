//! Sub-agents: one model-driven worker per task.
//!
//! - **Scope**: which paths a task may edit
//! - **Response**: the validated shapes a model reply can take
//! - **Prompt**: per-iteration messages
//! - **Executor**: the bounded edit loop, commit, and retry policy

mod executor;
mod prompt;
mod response;
mod scope;

pub use executor::{ExecutorLimits, SubAgentExecutor, TaskOutcome};
pub use prompt::{Feedback, iteration_messages};
pub use response::{AgentResponse, FileEdit, ResponseError, parse_agent_response};
pub use scope::{ScopeGuard, ScopeViolation, ScopeViolationType};
