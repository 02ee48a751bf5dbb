//! Config struct definitions and default implementations.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the orchestration engine.
///
/// Usually loaded from `.aether/config.yaml`. Unknown fields are ignored and
/// every field has a default, so an empty file is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Repository settings
    // =========================================================================
    /// Repository the engine edits. Without one, every message is answered
    /// conversationally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_path: Option<PathBuf>,

    /// Branch missions start from and merge into.
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    /// Where per-task worktrees are created (relative paths resolve against
    /// the repository root).
    #[serde(default = "default_worktrees_dir")]
    pub worktrees_dir: PathBuf,

    /// Remove task worktrees once a mission finishes.
    #[serde(default = "default_true")]
    pub cleanup_worktrees: bool,

    // =========================================================================
    // Persistence settings
    // =========================================================================
    /// Mission, task, agent, and conversation records.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Human-readable mission and agent logs.
    #[serde(default = "default_audit_dir")]
    pub audit_dir: PathBuf,

    // =========================================================================
    // Orchestration limits
    // =========================================================================
    /// Conversation entries replayed to the model in conversational mode.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Tasks of one mission executing at the same time.
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    /// Additional attempts for a failed task before it is marked failed.
    #[serde(default = "default_max_task_retries")]
    pub max_task_retries: u32,

    /// Model round-trips per task attempt.
    #[serde(default = "default_max_agent_iterations")]
    pub max_agent_iterations: u32,

    /// Consecutive unusable agent responses that fail an attempt.
    #[serde(default = "default_max_consecutive_parse_failures")]
    pub max_consecutive_parse_failures: u32,

    /// Directory depth of the file tree shown to the planner.
    #[serde(default = "default_file_tree_max_depth")]
    pub file_tree_max_depth: usize,

    /// Entry cap of the file tree shown to the planner.
    #[serde(default = "default_file_tree_max_entries")]
    pub file_tree_max_entries: usize,

    /// Per-file byte cap when showing in-scope files to an agent.
    #[serde(default = "default_max_scope_file_bytes")]
    pub max_scope_file_bytes: usize,

    // =========================================================================
    // Text generation
    // =========================================================================
    #[serde(default)]
    pub llm: LlmSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_path: None,
            base_branch: default_base_branch(),
            worktrees_dir: default_worktrees_dir(),
            cleanup_worktrees: true,
            state_dir: default_state_dir(),
            audit_dir: default_audit_dir(),
            history_window: default_history_window(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
            max_task_retries: default_max_task_retries(),
            max_agent_iterations: default_max_agent_iterations(),
            max_consecutive_parse_failures: default_max_consecutive_parse_failures(),
            file_tree_max_depth: default_file_tree_max_depth(),
            file_tree_max_entries: default_file_tree_max_entries(),
            max_scope_file_bytes: default_max_scope_file_bytes(),
            llm: LlmSettings::default(),
        }
    }
}

/// Endpoint, credentials, and model choices for text generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. Prefer the environment variable named by `api_key_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable that overrides `api_key`.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model for conversation and planning.
    #[serde(default = "default_orchestrator_model")]
    pub orchestrator_model: String,

    /// Model for task execution.
    #[serde(default = "default_agent_model")]
    pub agent_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_agent_temperature")]
    pub agent_temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_agent_max_tokens")]
    pub agent_max_tokens: u32,

    /// Deadline for a single completion.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            api_key_env: default_api_key_env(),
            orchestrator_model: default_orchestrator_model(),
            agent_model: default_agent_model(),
            temperature: default_temperature(),
            agent_temperature: default_agent_temperature(),
            max_tokens: default_max_tokens(),
            agent_max_tokens: default_agent_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
