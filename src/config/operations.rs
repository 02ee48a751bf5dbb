//! Config loading, validation, and path resolution.

use super::model::{Config, LlmSettings};
use super::types::CredentialState;
use crate::error::{AetherError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file location used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = ".aether/config.yaml";

/// Environment variable that overrides `repo_path`.
pub const ENV_REPO_PATH: &str = "AETHER_REPO_PATH";

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the config.yaml file
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(AetherError::Configuration)` - Read error, parse error, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            AetherError::Configuration(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config from `path` if it exists, otherwise use defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as null, not as an empty mapping.
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| {
                AetherError::Configuration(format!("failed to parse config YAML: {}", e))
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            AetherError::Configuration(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Apply overrides using `lookup` in place of the process environment.
    ///
    /// - `AETHER_REPO_PATH` replaces `repo_path`
    /// - the variable named by `llm.api_key_env` replaces `llm.api_key`
    ///
    /// Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(repo) = non_empty(ENV_REPO_PATH) {
            self.repo_path = Some(PathBuf::from(repo));
        }
        if let Some(key) = non_empty(self.llm.api_key_env.as_str()) {
            self.llm.api_key = Some(key);
        }
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - concurrency, iteration, parse-failure, and tree limits must be positive
    /// - `base_branch` must be a plausible branch name
    /// - `llm.base_url` must be an http(s) URL and `llm.timeout_secs` positive
    pub fn validate(&self) -> Result<()> {
        let positive: [(&str, usize); 6] = [
            ("max_concurrent_tasks", self.max_concurrent_tasks),
            ("max_agent_iterations", self.max_agent_iterations as usize),
            (
                "max_consecutive_parse_failures",
                self.max_consecutive_parse_failures as usize,
            ),
            ("file_tree_max_depth", self.file_tree_max_depth),
            ("file_tree_max_entries", self.file_tree_max_entries),
            ("max_scope_file_bytes", self.max_scope_file_bytes),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(AetherError::Configuration(format!(
                    "config validation failed: {} must be greater than 0",
                    name
                )));
            }
        }

        let branch = self.base_branch.trim();
        if branch.is_empty()
            || branch.starts_with('-')
            || branch.contains(char::is_whitespace)
            || branch.contains("..")
        {
            return Err(AetherError::Configuration(format!(
                "config validation failed: base_branch '{}' is not a valid branch name",
                self.base_branch
            )));
        }

        self.llm.validate()
    }

    /// Root that relative state paths resolve against.
    pub fn workspace_root(&self) -> PathBuf {
        self.repo_path.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn worktrees_path(&self) -> PathBuf {
        self.resolve(&self.worktrees_dir)
    }

    pub fn state_path(&self) -> PathBuf {
        self.resolve(&self.state_dir)
    }

    pub fn audit_path(&self) -> PathBuf {
        self.resolve(&self.audit_dir)
    }

    /// Repository-relative directories aether itself writes to. Agents may
    /// not edit inside them.
    pub fn reserved_paths(&self) -> Vec<String> {
        [&self.worktrees_dir, &self.state_dir, &self.audit_dir]
            .into_iter()
            .filter(|dir| dir.is_relative())
            .map(|dir| dir.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root().join(path)
        }
    }

    /// Copy with the API key masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.llm.api_key = self.llm.api_key.as_deref().map(mask);
        copy
    }
}

impl LlmSettings {
    pub fn credential_state(&self) -> CredentialState {
        CredentialState::classify(self.api_key.as_deref())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AetherError::Configuration(format!(
                "config validation failed: llm.base_url must start with http:// or https:// (found '{}')",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(AetherError::Configuration(
                "config validation failed: llm.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.orchestrator_model.trim().is_empty() || self.agent_model.trim().is_empty() {
            return Err(AetherError::Configuration(
                "config validation failed: llm model names must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{}****", visible)
}
