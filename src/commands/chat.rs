//! Implementation of the `aether chat` command.

use super::{Wiring, build_orchestrator, load_config};
use crate::cli::ChatArgs;
use crate::error::{AetherError, Result};
use crate::orchestrator::CONFIGURATION_REPLY;
use std::path::Path;

/// Execute the `aether chat` command: one message, one reply.
pub async fn cmd_chat(config_path: &Path, args: ChatArgs) -> Result<()> {
    let message = args.message.join(" ");
    if message.trim().is_empty() {
        return Err(AetherError::UserError("message is empty".to_string()));
    }

    let config = load_config(config_path)?;
    let orchestrator = build_orchestrator(config, Wiring::Full).await?;

    let reply = orchestrator.handle_user_message(&args.session, &message).await;
    println!("{}", reply);

    if reply == CONFIGURATION_REPLY {
        return Err(AetherError::Configuration(format!(
            "language model is not usable with {}",
            config_path.display()
        )));
    }
    Ok(())
}
