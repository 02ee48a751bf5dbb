//! Implementation of the `aether init` command.
//!
//! Writes a default `config.yaml` (API key left unset) so the remaining
//! settings can be edited in place.

use crate::cli::InitArgs;
use crate::config::Config;
use crate::error::{AetherError, Result};
use crate::fs::atomic_write;
use std::path::Path;

const HEADER: &str = "# aether configuration\n\
# Set llm.api_key here, or export the variable named by llm.api_key_env.\n\
# Set repo_path to enable missions; without it every message is conversational.\n";

/// Execute the `aether init` command.
pub fn cmd_init(path: &Path, args: InitArgs) -> Result<()> {
    write_default_config(path, args.force)?;

    println!("Wrote default config to {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set llm.api_key (or export {})", Config::default().llm.api_key_env);
    println!("  2. Set repo_path to the repository agents should work on");
    println!("  3. aether chat \"describe the change you want\"");
    Ok(())
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(AetherError::UserError(format!(
            "config file '{}' already exists.\n\nUse `aether init --force` to overwrite it.",
            path.display()
        )));
    }

    let yaml = Config::default().to_yaml()?;
    atomic_write(path, format!("{}\n{}", HEADER, yaml).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_written_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".aether/config.yaml");

        write_default_config(&path, false).unwrap();

        let config = Config::load(&path).unwrap();
        let defaults = Config::default();
        assert_eq!(config.base_branch, defaults.base_branch);
        assert_eq!(config.max_concurrent_tasks, defaults.max_concurrent_tasks);
        assert_eq!(config.llm.orchestrator_model, defaults.llm.orchestrator_model);
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_existing_config_requires_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "base_branch: develop\n").unwrap();

        let err = write_default_config(&path, false).unwrap_err();
        assert!(matches!(err, AetherError::UserError(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "base_branch: develop\n");

        write_default_config(&path, true).unwrap();
        assert_eq!(Config::load(&path).unwrap().base_branch, "main");
    }
}
