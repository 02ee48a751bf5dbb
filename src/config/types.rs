//! Configuration enums and serde default functions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which model settings a client is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelProfile {
    /// Conversation and planning.
    Orchestrator,
    /// Sub-agent task execution.
    Agent,
}

/// Whether the configured API key can be used at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Present,
    Missing,
    /// A value copied from a template and never filled in.
    Placeholder,
}

impl CredentialState {
    /// Classify a raw key value.
    pub fn classify(key: Option<&str>) -> Self {
        let Some(key) = key.map(str::trim) else {
            return Self::Missing;
        };
        if key.is_empty() {
            return Self::Missing;
        }

        let lower = key.to_ascii_lowercase();
        let is_placeholder = PLACEHOLDER_KEYS.contains(&lower.as_str())
            || (lower.starts_with('<') && lower.ends_with('>'))
            || (lower.starts_with("${") && lower.ends_with('}'))
            || lower.ends_with("...")
            || lower.contains("your-api-key")
            || lower.contains("your_api_key");

        if is_placeholder {
            Self::Placeholder
        } else {
            Self::Present
        }
    }

    pub fn is_usable(self) -> bool {
        self == Self::Present
    }
}

const PLACEHOLDER_KEYS: &[&str] = &[
    "changeme",
    "change-me",
    "placeholder",
    "xxx",
    "todo",
    "none",
    "null",
    "sk-",
    "sk-xxxx",
];

// Default value functions for serde
pub(crate) fn default_worktrees_dir() -> PathBuf {
    PathBuf::from(".aether/worktrees")
}
pub(crate) fn default_state_dir() -> PathBuf {
    PathBuf::from(".aether/state")
}
pub(crate) fn default_audit_dir() -> PathBuf {
    PathBuf::from(".aether/discussions")
}
pub(crate) fn default_base_branch() -> String {
    "main".to_string()
}
pub(crate) fn default_history_window() -> usize {
    20
}
pub(crate) fn default_max_concurrent_tasks() -> usize {
    3
}
pub(crate) fn default_max_task_retries() -> u32 {
    2
}
pub(crate) fn default_max_agent_iterations() -> u32 {
    5
}
pub(crate) fn default_max_consecutive_parse_failures() -> u32 {
    2
}
pub(crate) fn default_file_tree_max_depth() -> usize {
    3
}
pub(crate) fn default_file_tree_max_entries() -> usize {
    400
}
pub(crate) fn default_max_scope_file_bytes() -> usize {
    64 * 1024
}
pub(crate) fn default_true() -> bool {
    true
}
pub(crate) fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}
pub(crate) fn default_api_key_env() -> String {
    "AETHER_API_KEY".to_string()
}
pub(crate) fn default_orchestrator_model() -> String {
    "openai/gpt-4o".to_string()
}
pub(crate) fn default_agent_model() -> String {
    "openai/gpt-4o-mini".to_string()
}
pub(crate) fn default_temperature() -> f32 {
    0.3
}
pub(crate) fn default_agent_temperature() -> f32 {
    0.2
}
pub(crate) fn default_max_tokens() -> u32 {
    4096
}
pub(crate) fn default_agent_max_tokens() -> u32 {
    8192
}
pub(crate) fn default_timeout_secs() -> u64 {
    60
}
