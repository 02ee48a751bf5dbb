//! Task planning: user request + repository listing -> ordered task specs.
//!
//! The planner makes one completion call per attempt. Transport failures
//! are retried up to the configured bound; a response that does not parse
//! into a complete plan fails immediately with `AetherError::Planning`.

mod parse;
mod prompt;

pub use parse::parse_plan;
pub use prompt::planning_messages;

use crate::error::{AetherError, Result};
use crate::git_worktree::FileTree;
use crate::llm::{TextGeneration, complete_with_timeout};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One planned unit of work, in plan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTask {
    pub title: String,
    pub description: String,
    pub file_scope: Vec<String>,
}

/// A validated plan. No tasks means the request needs no file changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub summary: Option<String>,
    pub tasks: Vec<PlannedTask>,
}

pub struct TaskPlanner {
    llm: Arc<dyn TextGeneration>,
    timeout: Duration,
    max_retries: u32,
    backoff: Duration,
}

impl TaskPlanner {
    pub fn new(llm: Arc<dyn TextGeneration>, timeout: Duration, max_retries: u32) -> Self {
        Self {
            llm,
            timeout,
            max_retries,
            backoff: Duration::from_secs(1),
        }
    }

    /// Base delay between transport retries; doubled after each attempt.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Plan `request` against a snapshot of the repository.
    ///
    /// # Returns
    ///
    /// * `Ok(Plan)` - A complete plan, possibly with zero tasks
    /// * `Err(AetherError::Planning)` - The response was unusable
    /// * `Err(AetherError::Transport)` - The endpoint failed on every attempt,
    ///   or rejected the credentials (not retried)
    pub async fn plan(&self, request: &str, tree: &FileTree) -> Result<Plan> {
        let messages = planning_messages(request, tree);

        let mut attempt = 0;
        let response = loop {
            match complete_with_timeout(self.llm.as_ref(), &messages, self.timeout).await {
                Ok(text) => break text,
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, error = %e, "planner request failed; retrying");
                    tokio::time::sleep(self.backoff * 2u32.saturating_pow(attempt - 1)).await;
                }
                Err(e) => return Err(AetherError::Transport(e)),
            }
        };

        debug!(chars = response.len(), "planner response received");
        let plan = parse_plan(&response)?;
        info!(tasks = plan.tasks.len(), "plan ready");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::test_support::ScriptedLlm;

    fn planner(llm: Arc<ScriptedLlm>) -> TaskPlanner {
        TaskPlanner::new(llm, Duration::from_secs(5), 2).with_backoff(Duration::ZERO)
    }

    const PLAN: &str = r#"{"plan_summary":"Greeting","tasks":[{"title":"Write hello","description":"Create hello.txt","files_scope":["hello.txt"]}]}"#;

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Err(LlmError::RateLimited("429".into())),
            Err(LlmError::Unreachable("reset".into())),
            Ok(PLAN.to_string()),
        ]));
        let plan = planner(llm.clone())
            .plan("add greeting", &FileTree::default())
            .await
            .unwrap();
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(llm.calls(), 3);
    }

    #[tokio::test]
    async fn test_retry_bound_is_respected() {
        let llm = Arc::new(ScriptedLlm::failing(LlmError::Unreachable("down".into())));
        let err = planner(llm.clone())
            .plan("add greeting", &FileTree::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AetherError::Transport(LlmError::Unreachable(_))));
        assert_eq!(llm.calls(), 3);
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_not_retried() {
        let llm = Arc::new(ScriptedLlm::failing(LlmError::Unauthorized("401".into())));
        let err = planner(llm.clone())
            .plan("add greeting", &FileTree::default())
            .await
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_plan_is_not_retried() {
        let llm = Arc::new(ScriptedLlm::replies(&["sure, I will do that"]));
        let err = planner(llm.clone())
            .plan("add greeting", &FileTree::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AetherError::Planning(_)));
        assert_eq!(llm.calls(), 1);
    }
}
