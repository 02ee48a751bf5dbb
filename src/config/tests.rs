//! Tests for config functionality.

use crate::config::{Config, CredentialState, LlmSettings};
use serial_test::serial;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert!(config.repo_path.is_none());
    assert_eq!(config.base_branch, "main");
    assert_eq!(config.worktrees_dir, PathBuf::from(".aether/worktrees"));
    assert_eq!(config.state_dir, PathBuf::from(".aether/state"));
    assert_eq!(config.history_window, 20);
    assert_eq!(config.max_concurrent_tasks, 3);
    assert_eq!(config.max_task_retries, 2);
    assert_eq!(config.max_agent_iterations, 5);
    assert_eq!(config.max_consecutive_parse_failures, 2);
    assert_eq!(config.file_tree_max_depth, 3);
    assert!(config.cleanup_worktrees);
    assert_eq!(config.llm.timeout(), Duration::from_secs(60));
    assert_eq!(config.llm.base_url, "https://openrouter.ai/api/v1");
    assert_eq!(config.llm.api_key_env, "AETHER_API_KEY");
}

#[test]
fn test_parse_empty_yaml() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config.max_concurrent_tasks, 3);
    assert_eq!(config.base_branch, "main");
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
repo_path: /srv/project
max_concurrent_tasks: 5
llm:
  agent_model: local/coder
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.repo_path, Some(PathBuf::from("/srv/project")));
    assert_eq!(config.max_concurrent_tasks, 5);
    assert_eq!(config.llm.agent_model, "local/coder");

    // Unspecified values should use defaults
    assert_eq!(config.llm.orchestrator_model, "openai/gpt-4o");
    assert_eq!(config.history_window, 20);
}

#[test]
fn test_unknown_fields_are_ignored() {
    let yaml = r#"
base_branch: develop
some_future_setting: 42
llm:
  streaming: true
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.base_branch, "develop");
}

#[test]
fn test_zero_limits_are_rejected() {
    for field in [
        "max_concurrent_tasks",
        "max_agent_iterations",
        "max_consecutive_parse_failures",
        "file_tree_max_entries",
    ] {
        let err = Config::from_yaml(&format!("{}: 0", field)).unwrap_err();
        assert!(
            err.to_string().contains(field),
            "error for {} should name the field: {}",
            field,
            err
        );
        assert!(err.is_configuration());
    }
}

#[test]
fn test_zero_retries_are_allowed() {
    let config = Config::from_yaml("max_task_retries: 0").unwrap();
    assert_eq!(config.max_task_retries, 0);
}

#[test]
fn test_invalid_base_branch_rejected() {
    assert!(Config::from_yaml("base_branch: \"my branch\"").is_err());
    assert!(Config::from_yaml("base_branch: \"-main\"").is_err());
    assert!(Config::from_yaml("base_branch: \"a..b\"").is_err());
}

#[test]
fn test_invalid_base_url_rejected() {
    let err = Config::from_yaml("llm:\n  base_url: ftp://example.com").unwrap_err();
    assert!(err.to_string().contains("llm.base_url"));
}

#[test]
fn test_malformed_yaml_is_configuration_error() {
    let err = Config::from_yaml("max_concurrent_tasks: [unclosed").unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("failed to parse config YAML"));
}

#[test]
fn test_yaml_round_trip_preserves_values() {
    let mut config = Config::default();
    config.repo_path = Some(PathBuf::from("/tmp/repo"));
    config.max_task_retries = 1;

    let yaml = config.to_yaml().unwrap();
    let parsed = Config::from_yaml(&yaml).unwrap();
    assert_eq!(parsed.repo_path, config.repo_path);
    assert_eq!(parsed.max_task_retries, 1);
}

#[test]
fn test_env_overrides_with_lookup() {
    let mut config = Config::default();
    config.apply_env_with(|name| match name {
        "AETHER_REPO_PATH" => Some("/work/repo".to_string()),
        "AETHER_API_KEY" => Some("sk-live-abc123".to_string()),
        _ => None,
    });

    assert_eq!(config.repo_path, Some(PathBuf::from("/work/repo")));
    assert_eq!(config.llm.api_key.as_deref(), Some("sk-live-abc123"));
}

#[test]
fn test_env_override_uses_configured_variable_name() {
    let mut config = Config::from_yaml("llm:\n  api_key_env: OPENROUTER_API_KEY").unwrap();
    config.apply_env_with(|name| (name == "OPENROUTER_API_KEY").then(|| "or-key-1".to_string()));
    assert_eq!(config.llm.api_key.as_deref(), Some("or-key-1"));
}

#[test]
fn test_empty_env_values_do_not_override() {
    let mut config = Config::from_yaml("llm:\n  api_key: from-file-key").unwrap();
    config.apply_env_with(|_| Some("   ".to_string()));
    assert_eq!(config.llm.api_key.as_deref(), Some("from-file-key"));
    assert!(config.repo_path.is_none());
}

#[test]
#[serial]
fn test_apply_env_reads_process_environment() {
    // SAFETY: serialized with other environment-touching tests.
    unsafe {
        std::env::set_var("AETHER_TEST_KEY_VAR", "env-provided-key");
    }

    let mut config = Config::from_yaml("llm:\n  api_key_env: AETHER_TEST_KEY_VAR").unwrap();
    config.apply_env();
    assert_eq!(config.llm.api_key.as_deref(), Some("env-provided-key"));

    unsafe {
        std::env::remove_var("AETHER_TEST_KEY_VAR");
    }
}

#[test]
fn test_credential_classification() {
    assert_eq!(CredentialState::classify(None), CredentialState::Missing);
    assert_eq!(CredentialState::classify(Some("  ")), CredentialState::Missing);
    assert_eq!(
        CredentialState::classify(Some("changeme")),
        CredentialState::Placeholder
    );
    assert_eq!(
        CredentialState::classify(Some("<your key here>")),
        CredentialState::Placeholder
    );
    assert_eq!(
        CredentialState::classify(Some("sk-...")),
        CredentialState::Placeholder
    );
    assert_eq!(
        CredentialState::classify(Some("your-api-key")),
        CredentialState::Placeholder
    );
    assert_eq!(
        CredentialState::classify(Some("sk-or-v1-2f9c0d")),
        CredentialState::Present
    );
}

#[test]
fn test_llm_settings_credential_state() {
    let settings = LlmSettings::default();
    assert!(!settings.credential_state().is_usable());

    let settings = LlmSettings {
        api_key: Some("real-key-123".to_string()),
        ..LlmSettings::default()
    };
    assert!(settings.credential_state().is_usable());
}

#[test]
fn test_paths_resolve_against_repo() {
    let mut config = Config::default();
    assert_eq!(config.state_path(), PathBuf::from("./.aether/state"));

    config.repo_path = Some(PathBuf::from("/srv/repo"));
    assert_eq!(config.worktrees_path(), PathBuf::from("/srv/repo/.aether/worktrees"));

    config.audit_dir = PathBuf::from("/var/log/aether");
    assert_eq!(config.audit_path(), PathBuf::from("/var/log/aether"));
}

#[test]
fn test_reserved_paths_skip_absolute_dirs() {
    let mut config = Config::default();
    assert!(config.reserved_paths().contains(&".aether/worktrees".to_string()));
    assert!(config.reserved_paths().contains(&".aether/state".to_string()));

    config.audit_dir = PathBuf::from("/var/log/aether");
    assert_eq!(config.reserved_paths().len(), 2);
}

#[test]
fn test_redacted_masks_api_key() {
    let mut config = Config::default();
    config.llm.api_key = Some("sk-live-secret".to_string());
    let shown = config.redacted().to_yaml().unwrap();
    assert!(shown.contains("sk-l****"));
    assert!(!shown.contains("secret"));
}
