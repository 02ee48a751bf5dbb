//! CLI argument parsing for aether.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Aether: plans coding requests into tasks, runs one LLM agent per task on
/// its own git branch, and merges the results.
///
/// Without a configured repository every message is answered conversationally.
#[derive(Parser, Debug)]
#[command(name = "aether")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file.
    #[arg(long, global = true, default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for aether.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default config file.
    ///
    /// The API key is left unset; provide it in the file or through the
    /// environment variable named by `llm.api_key_env`.
    Init(InitArgs),

    /// Send one message and print the reply.
    ///
    /// Task-shaped messages against a configured repository start a mission;
    /// everything else is answered conversationally.
    Chat(ChatArgs),

    /// List recorded missions, oldest first.
    Missions,

    /// Show a mission with its tasks, agents, and merge results.
    Show(ShowArgs),

    /// Print the effective configuration with the API key masked.
    Config,
}

/// Arguments for the `init` command.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `chat` command.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Conversation session to continue.
    #[arg(short, long, default_value = "default")]
    pub session: String,

    /// The message; multiple words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    pub message: Vec<String>,
}

/// Arguments for the `show` command.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Mission id (full UUID).
    pub mission_id: String,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_chat_joins_words() {
        let cli = Cli::try_parse_from(["aether", "chat", "-s", "s1", "add", "a", "test"]).unwrap();
        match cli.command {
            Command::Chat(args) => {
                assert_eq!(args.session, "s1");
                assert_eq!(args.message.join(" "), "add a test");
            }
            other => panic!("expected chat, got {:?}", other),
        }
        assert_eq!(cli.config, PathBuf::from(crate::config::DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["aether", "missions", "--config", "alt.yaml"]).unwrap();
        assert!(matches!(cli.command, Command::Missions));
        assert_eq!(cli.config, PathBuf::from("alt.yaml"));
    }

    #[test]
    fn test_chat_requires_a_message() {
        assert!(Cli::try_parse_from(["aether", "chat"]).is_err());
    }
}
