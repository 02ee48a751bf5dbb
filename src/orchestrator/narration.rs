//! User-facing replies.
//!
//! Every reply the orchestrator returns is built here. Internal error text
//! never reaches the user verbatim.

use crate::agent::TaskOutcome;
use crate::error::AetherError;
use crate::llm::LlmError;
use crate::merge::MergeReport;
use crate::model::{MergeResult, Mission, MissionStatus};
use std::fmt::Write as _;

/// Reply when no usable credentials are configured or the endpoint rejects them.
pub const CONFIGURATION_REPLY: &str = "I can't reach my language model because it isn't configured. \
Set `llm.api_key` in `.aether/config.yaml` (or the AETHER_API_KEY environment variable) \
to a valid key, check `llm.base_url`, and try again.";

const UNAVAILABLE_REPLY: &str = "My language model didn't answer in time, so I couldn't respond. \
Please try again in a moment.";

const STORE_REPLY: &str =
    "I couldn't record this request, so nothing was started. Check that the state directory is writable.";

/// Reply for a failed conversational or direct-answer round-trip.
pub fn conversation_failure(error: &AetherError) -> String {
    match error {
        AetherError::Configuration(_) => CONFIGURATION_REPLY.to_string(),
        AetherError::Transport(LlmError::Unauthorized(_) | LlmError::Unreachable(_)) => {
            CONFIGURATION_REPLY.to_string()
        }
        AetherError::Store(_) => STORE_REPLY.to_string(),
        _ => UNAVAILABLE_REPLY.to_string(),
    }
}

/// Reply when a mission could not start or could not be planned.
pub fn planning_failure(error: &AetherError) -> String {
    match error {
        e if e.is_configuration() => CONFIGURATION_REPLY.to_string(),
        AetherError::Transport(_) => "I couldn't plan that request because my language model \
kept failing. Nothing in the repository was changed; please try again shortly."
            .to_string(),
        AetherError::Store(_) => STORE_REPLY.to_string(),
        AetherError::Git(_) => "I couldn't read the repository to plan that request. Nothing \
was changed; check that the configured repository is accessible."
            .to_string(),
        _ => "I couldn't turn that request into a usable plan, so nothing in the repository was \
changed. Try describing which files or behaviour should change."
            .to_string(),
    }
}

/// Final report for a mission that ran its tasks.
pub fn mission_report(mission: &Mission, outcomes: &[TaskOutcome], report: &MergeReport) -> String {
    let mut out = String::new();
    let heading = match mission.status {
        MissionStatus::Completed => "Mission complete",
        _ => "Mission failed",
    };
    let _ = writeln!(out, "**{}:** {}\n", heading, mission.title);

    let merged: Vec<_> = report
        .results
        .iter()
        .filter(|r| r.result.is_merged())
        .collect();
    if !merged.is_empty() {
        let _ = writeln!(out, "Merged into `{}`:", mission.base_branch);
        for record in &merged {
            let files = outcomes
                .iter()
                .find(|o| o.task.id == record.task_id)
                .map(|o| o.files_changed.join(", "))
                .unwrap_or_default();
            if files.is_empty() {
                let _ = writeln!(out, "  ✓ {}", record.task_title);
            } else {
                let _ = writeln!(out, "  ✓ {} ({})", record.task_title, files);
            }
        }
        out.push('\n');
    }

    let unmerged: Vec<_> = report
        .results
        .iter()
        .filter(|r| !r.result.is_merged())
        .collect();
    if !unmerged.is_empty() {
        out.push_str("Not merged:\n");
        for record in unmerged {
            let why = match &record.result {
                MergeResult::Conflict { .. } => {
                    "its changes conflicted with earlier work; the branch was kept for review"
                        .to_string()
                }
                MergeResult::Skipped { .. } => outcomes
                    .iter()
                    .find(|o| o.task.id == record.task_id)
                    .map(skipped_reason)
                    .unwrap_or_else(|| "it did not finish".to_string()),
                MergeResult::Merged { .. } => continue,
            };
            let _ = writeln!(
                out,
                "  ✗ {} ({}): {}",
                record.task_title,
                record.result.label(),
                why
            );
        }
        out.push('\n');
    }

    if report.base_broken {
        let _ = writeln!(
            out,
            "A merge could not be cleanly aborted, so `{}` needs manual attention before more work lands.\n",
            mission.base_branch
        );
    }
    if outcomes.iter().any(|o| o.configuration_error) {
        let _ = writeln!(out, "{}\n", CONFIGURATION_REPLY);
    }

    out.trim_end().to_string()
}

fn skipped_reason(outcome: &TaskOutcome) -> String {
    if outcome.configuration_error {
        return "the language model rejected the configured credentials".to_string();
    }
    let attempts = outcome.task.retry_count + 1;
    let plural = if attempts == 1 { "attempt" } else { "attempts" };
    let reason = outcome.task.failure.as_deref().unwrap_or("");
    if reason.contains("unusable responses") {
        format!(
            "the agent's replies could not be understood ({} {})",
            attempts, plural
        )
    } else if reason.contains("without applying any edits") || reason.contains("no changes") {
        format!("the agent made no changes ({} {})", attempts, plural)
    } else if reason.contains("model endpoint") {
        format!("the language model kept failing ({} {})", attempts, plural)
    } else {
        format!("the task failed after {} {}", attempts, plural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_details_are_not_leaked() {
        let err = AetherError::Transport(LlmError::Unreachable(
            "tcp connect error: 10.0.0.1:443".to_string(),
        ));
        let reply = conversation_failure(&err);
        assert_eq!(reply, CONFIGURATION_REPLY);
        assert!(!reply.contains("10.0.0.1"));

        let reply = conversation_failure(&AetherError::Transport(LlmError::RateLimited(
            "429 quota".to_string(),
        )));
        assert!(!reply.contains("429"));
    }

    #[test]
    fn test_planning_failure_replies() {
        let reply = planning_failure(&AetherError::Planning("missing key `tasks`".to_string()));
        assert!(reply.contains("nothing in the repository was changed"));
        assert!(!reply.contains("tasks"));
        assert_eq!(
            planning_failure(&AetherError::Transport(LlmError::Unauthorized("401".into()))),
            CONFIGURATION_REPLY
        );
    }
}
