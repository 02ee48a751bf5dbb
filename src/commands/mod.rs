//! Command implementations for aether.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the wiring that turns a config file into a
//! ready [`Orchestrator`].

mod chat;
mod init;
mod show;

use crate::audit::MarkdownAuditTrail;
use crate::cli::{Cli, Command};
use crate::config::{Config, ModelProfile};
use crate::error::{AetherError, Result};
use crate::llm::OpenAiClient;
use crate::orchestrator::Orchestrator;
use crate::store::FileStore;
use crate::vcs::{GitRepository, VersionControl};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Dispatch a command to its implementation.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Init(args) => init::cmd_init(&cli.config, args),
        Command::Chat(args) => chat::cmd_chat(&cli.config, args).await,
        Command::Missions => show::cmd_missions(&cli.config).await,
        Command::Show(args) => show::cmd_show(&cli.config, args).await,
        Command::Config => cmd_config(&cli.config),
    }
}

/// Load the config file (or defaults), apply environment overrides, validate.
pub(crate) fn load_config(path: &Path) -> Result<Config> {
    let mut config = Config::load_or_default(path)?;
    config.apply_env();
    config.validate()?;
    debug!(path = %path.display(), repo = ?config.repo_path, "config loaded");
    Ok(config)
}

/// Whether the orchestrator needs the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wiring {
    /// Conversation and orchestration.
    Full,
    /// Status accessors only.
    ReadOnly,
}

/// Build an orchestrator from `config`.
pub(crate) async fn build_orchestrator(config: Config, wiring: Wiring) -> Result<Orchestrator> {
    let store = Arc::new(FileStore::open(config.state_path())?);
    let audit = Arc::new(MarkdownAuditTrail::new(config.audit_path()));
    let llm = Arc::new(OpenAiClient::from_settings(
        &config.llm,
        ModelProfile::Orchestrator,
    )?);
    let agent_llm = Arc::new(OpenAiClient::from_settings(&config.llm, ModelProfile::Agent)?);

    let repository = match (&config.repo_path, wiring) {
        (Some(path), Wiring::Full) => Some(open_repository(&config, path).await?),
        _ => None,
    };

    let mut orchestrator = Orchestrator::new(config, llm, store, audit).with_agent_llm(agent_llm);
    if let Some(repository) = repository {
        info!(root = %repository.root().display(), "orchestration enabled");
        orchestrator = orchestrator.with_repository(Arc::new(repository));
    }
    Ok(orchestrator)
}

async fn open_repository(config: &Config, path: &Path) -> Result<GitRepository> {
    let repository = GitRepository::open(path, config.worktrees_dir.clone()).await?;
    let root = repository.root().to_path_buf();
    let under_root = |dir: &PathBuf| {
        if dir.is_absolute() {
            dir.clone()
        } else {
            root.join(dir)
        }
    };
    let skip = vec![under_root(&config.state_dir), under_root(&config.audit_dir)];
    Ok(repository.with_skip_paths(skip))
}

/// Execute the `aether config` command.
fn cmd_config(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let yaml = config.redacted().to_yaml()?;
    println!("# {}", path.display());
    print!("{}", yaml);
    println!();
    println!("# credentials: {:?}", config.llm.credential_state());
    Ok(())
}

/// Reject ids that are not ids before touching the store.
fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T> {
    raw.parse().map_err(|_| {
        AetherError::UserError(format!(
            "'{}' is not a valid {} id.\n\nUse `aether missions` to list missions.",
            raw, what
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MissionId;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_load_config_defaults_when_file_missing() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("missing.yaml")).unwrap();
        assert_eq!(config.base_branch, "main");
    }

    #[test]
    #[serial]
    fn test_load_config_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "max_concurrent_tasks: 0\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_parse_id() {
        let id = MissionId::new();
        let parsed: MissionId = parse_id(&id.to_string(), "mission").unwrap();
        assert_eq!(parsed, id);
        let err = parse_id::<MissionId>("nope", "mission").unwrap_err();
        assert!(matches!(err, AetherError::UserError(_)));
    }

    #[tokio::test]
    async fn test_read_only_wiring_skips_repository() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        // Not a repository: opening it would fail.
        config.repo_path = Some(dir.path().to_path_buf());
        let orchestrator = build_orchestrator(config, Wiring::ReadOnly).await.unwrap();
        assert!(!orchestrator.has_repository());
        assert!(orchestrator.missions().await.unwrap().is_empty());
    }
}
