//! Sub-agent executor: runs one task to a terminal status.
//!
//! Each task gets exactly one agent and one branch. An attempt is a bounded
//! loop of model round-trips whose edits are applied in the task's own
//! workspace and committed when the loop ends. A failed attempt is retried on
//! the same agent and branch, after resetting the workspace to the branch
//! head, until the retry bound is spent.

use super::prompt::{Feedback, iteration_messages};
use super::response::{AgentResponse, FileEdit, parse_agent_response};
use super::scope::ScopeGuard;
use crate::audit::{self, AuditTrail, LogSection};
use crate::error::{AetherError, Result};
use crate::fs::{delete_file, read_scoped_files, write_file};
use crate::git_worktree::{TreeLimits, snapshot_tree, task_branch_name};
use crate::llm::{TextGeneration, complete_with_timeout};
use crate::model::{Agent, Mission, Task, TaskStatus};
use crate::store::Store;
use crate::vcs::{VersionControl, Workspace};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Bounds for one executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorLimits {
    pub max_iterations: u32,
    pub max_consecutive_parse_failures: u32,
    pub max_retries: u32,
    pub max_file_bytes: usize,
    pub timeout: Duration,
    /// Bounds for discovering scoped files in the workspace.
    pub tree: TreeLimits,
}

impl Default for ExecutorLimits {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            max_consecutive_parse_failures: 2,
            max_retries: 2,
            max_file_bytes: 64 * 1024,
            timeout: Duration::from_secs(60),
            tree: TreeLimits {
                max_depth: 8,
                max_entries: 2000,
            },
        }
    }
}

/// What happened to one task.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    /// The task in its terminal status.
    pub task: Task,
    pub agent: Agent,
    pub files_changed: Vec<String>,
    pub summary: String,
    /// The endpoint rejected the credentials.
    pub configuration_error: bool,
}

impl TaskOutcome {
    pub fn status(&self) -> TaskStatus {
        self.task.status
    }
}

struct AttemptResult {
    files_changed: Vec<String>,
    commit: String,
    summary: String,
}

pub struct SubAgentExecutor {
    llm: Arc<dyn TextGeneration>,
    vcs: Arc<dyn VersionControl>,
    store: Arc<dyn Store>,
    audit: Arc<dyn AuditTrail>,
    limits: ExecutorLimits,
    reserved_paths: Vec<String>,
}

impl SubAgentExecutor {
    pub fn new(
        llm: Arc<dyn TextGeneration>,
        vcs: Arc<dyn VersionControl>,
        store: Arc<dyn Store>,
        audit: Arc<dyn AuditTrail>,
        limits: ExecutorLimits,
    ) -> Self {
        Self {
            llm,
            vcs,
            store,
            audit,
            limits,
            reserved_paths: Vec::new(),
        }
    }

    /// Repository-relative directories edits may never touch, on top of
    /// every task's file scope.
    pub fn with_reserved_paths(mut self, paths: Vec<String>) -> Self {
        self.reserved_paths = paths;
        self
    }

    /// Run `task` on its deterministic branch created from `branch_base`.
    ///
    /// Never returns an error: every failure ends as a `failed` task with
    /// its reason recorded.
    #[instrument(skip_all, fields(mission_id = %mission.id, task_id = %task.id))]
    pub async fn execute(&self, mission: &Mission, mut task: Task, branch_base: &str) -> TaskOutcome {
        let branch = task_branch_name(mission.id, task.id);
        let mut agent = Agent::new(mission.id, task.id, self.llm.model(), branch.clone());

        if let Err(e) = task.assign_agent(agent.id, branch.clone()).and_then(|()| task.start()) {
            error!(error = %e, "task cannot start");
            return self.finish(mission, task, agent, Err(e)).await;
        }
        agent.mirror(task.status);
        self.persist(&task, &agent).await;
        audit::record(
            "agent header",
            self.audit.write_agent_header(mission, &task, &agent),
        )
        .await;
        info!(agent = %agent.name, branch = %branch, "agent started");

        let mut attempt = 0;
        let result = loop {
            if attempt > 0 {
                if let Err(e) = task.record_retry() {
                    break Err(e);
                }
                self.persist(&task, &agent).await;
            }

            match self.attempt(mission, &task, &agent, branch_base, attempt).await {
                Ok(done) => break Ok(done),
                Err(e) if e.is_retryable() && attempt < self.limits.max_retries => {
                    warn!(attempt = attempt + 1, error = %e, "attempt failed; retrying");
                    self.log(
                        mission,
                        &agent,
                        format!("Attempt {} failed", attempt + 1),
                        format!("{}\n\nRetrying on the same branch.", e),
                    )
                    .await;
                    attempt += 1;
                }
                Err(e) => break Err(e),
            }
        };

        self.finish(mission, task, agent, result).await
    }

    async fn attempt(
        &self,
        mission: &Mission,
        task: &Task,
        agent: &Agent,
        branch_base: &str,
        attempt: u32,
    ) -> Result<AttemptResult> {
        let guard = ScopeGuard::new(&task.file_scope)
            .map_err(AetherError::Execution)?
            .with_reserved(&self.reserved_paths);
        let workspace = self.vcs.branch(&agent.branch, branch_base).await?;
        if attempt > 0 || workspace.reused {
            self.vcs.reset(&workspace).await?;
        }

        let mut applied: BTreeSet<String> = BTreeSet::new();
        let mut feedback: Vec<Feedback> = Vec::new();
        let mut consecutive_failures = 0;
        let mut summary: Option<String> = None;
        let mut last_rationale = String::new();

        for iteration in 1..=self.limits.max_iterations {
            let visible = self.visible_files(&workspace, &guard, &applied).await?;
            let files = read_scoped_files(&workspace.path, &visible, self.limits.max_file_bytes).await;
            let messages = iteration_messages(
                task,
                &files,
                &feedback,
                iteration,
                self.limits.max_iterations,
            );

            let text = complete_with_timeout(self.llm.as_ref(), &messages, self.limits.timeout).await?;
            debug!(iteration, chars = text.len(), "agent response received");

            let response = parse_agent_response(&text)
                .map_err(|e| e.to_string())
                .and_then(|r| check_scope(r, &guard));

            match response {
                Err(reason) => {
                    consecutive_failures += 1;
                    warn!(iteration, reason = %reason, "agent response rejected");
                    self.log(
                        mission,
                        agent,
                        format!("Iteration {}: response rejected", iteration),
                        format!("{}\n\n```\n{}\n```", reason, excerpt(&text)),
                    )
                    .await;
                    if consecutive_failures >= self.limits.max_consecutive_parse_failures {
                        return Err(AetherError::Execution(format!(
                            "{} consecutive unusable responses from the model; last: {}",
                            consecutive_failures, reason
                        )));
                    }
                    feedback.push(Feedback::Rejected { reason });
                }
                Ok(AgentResponse::EditSet {
                    rationale,
                    edits,
                    complete,
                }) => {
                    consecutive_failures = 0;
                    let touched = apply_edits(&workspace, &edits).await?;
                    applied.extend(touched.iter().cloned());
                    self.log(
                        mission,
                        agent,
                        format!("Iteration {}", iteration),
                        format!("{}\n\n**Files:** {}", rationale.trim(), list_or_none(&touched)),
                    )
                    .await;
                    feedback.push(Feedback::Applied { files: touched });
                    last_rationale = rationale;
                    if complete {
                        summary = Some(last_rationale.clone());
                        break;
                    }
                }
                Ok(AgentResponse::Clarification { question }) => {
                    consecutive_failures = 0;
                    self.log(
                        mission,
                        agent,
                        format!("Iteration {}: clarification requested", iteration),
                        question.clone(),
                    )
                    .await;
                    feedback.push(Feedback::Clarification { question });
                }
                Ok(AgentResponse::Completion { summary: done }) => {
                    self.log(
                        mission,
                        agent,
                        format!("Iteration {}: completion", iteration),
                        done.clone(),
                    )
                    .await;
                    summary = Some(done);
                    break;
                }
            }
        }

        if applied.is_empty() {
            return Err(AetherError::Execution(
                "the agent finished without applying any edits".to_string(),
            ));
        }

        let message = format!("[{}] {}", agent.name, task.title);
        let commit = self.vcs.commit(&workspace, &message).await?.ok_or_else(|| {
            AetherError::Execution("the applied edits left no changes to commit".to_string())
        })?;

        let summary = summary
            .filter(|s| !s.trim().is_empty())
            .or_else(|| Some(last_rationale).filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| format!("Changed {} file(s)", applied.len()));

        Ok(AttemptResult {
            files_changed: applied.into_iter().collect(),
            commit,
            summary: summary.trim().to_string(),
        })
    }

    /// Scoped files in the workspace plus everything already edited.
    async fn visible_files(
        &self,
        workspace: &Workspace,
        guard: &ScopeGuard,
        applied: &BTreeSet<String>,
    ) -> Result<Vec<String>> {
        let root = workspace.path.clone();
        let limits = self.limits.tree;
        let tree = tokio::task::spawn_blocking(move || snapshot_tree(&root, limits, &[]))
            .await
            .map_err(|e| AetherError::Execution(format!("file listing task failed: {}", e)))??;

        let mut files = guard.visible_files(tree.files());
        files.extend(applied.iter().cloned());
        files.sort();
        files.dedup();
        Ok(files)
    }

    async fn finish(
        &self,
        mission: &Mission,
        mut task: Task,
        mut agent: Agent,
        result: Result<AttemptResult>,
    ) -> TaskOutcome {
        let mut configuration_error = false;
        let (files_changed, summary) = match result {
            Ok(done) => {
                let files = done.files_changed.clone();
                if let Err(e) = task.succeed(done.files_changed, Some(done.commit.clone()), &done.summary) {
                    error!(error = %e, "task could not be marked succeeded");
                }
                info!(files = files.len(), commit = %done.commit, "task succeeded");
                self.log(
                    mission,
                    &agent,
                    "Result".to_string(),
                    format!(
                        "**Status:** succeeded\n**Commit:** `{}`\n**Files:** {}\n\n{}",
                        done.commit,
                        list_or_none(&files),
                        done.summary
                    ),
                )
                .await;
                (files, done.summary)
            }
            Err(e) => {
                configuration_error = e.is_configuration();
                let reason = failure_reason(&e, task.retry_count);
                if let Err(state) = task.fail(reason.clone()) {
                    error!(error = %state, "task could not be marked failed");
                }
                error!(error = %e, retries = task.retry_count, "task failed");
                self.log(
                    mission,
                    &agent,
                    "Result".to_string(),
                    format!("**Status:** failed\n\n{}", reason),
                )
                .await;
                (Vec::new(), reason)
            }
        };

        agent.mirror(task.status);
        self.persist(&task, &agent).await;

        TaskOutcome {
            task,
            agent,
            files_changed,
            summary,
            configuration_error,
        }
    }

    async fn persist(&self, task: &Task, agent: &Agent) {
        if let Err(e) = self.store.save_task(task).await {
            error!(task_id = %task.id, error = %e, "failed to persist task");
        }
        if let Err(e) = self.store.save_agent(agent).await {
            error!(agent_id = %agent.id, error = %e, "failed to persist agent");
        }
    }

    async fn log(&self, mission: &Mission, agent: &Agent, heading: String, body: String) {
        let section = LogSection::new(heading, body);
        audit::record(
            "agent log",
            self.audit.append_agent_log(mission.id, agent, &section),
        )
        .await;
    }
}

/// Reject edit sets that leave the task scope; the message is model feedback.
fn check_scope(
    response: AgentResponse,
    guard: &ScopeGuard,
) -> std::result::Result<AgentResponse, String> {
    let (rationale, edits, complete) = match response {
        AgentResponse::EditSet {
            rationale,
            edits,
            complete,
        } => (rationale, edits, complete),
        other => return Ok(other),
    };

    let mut checked = Vec::with_capacity(edits.len());
    let mut violations = Vec::new();
    for edit in edits {
        match (guard.check(edit.path()), edit) {
            (Ok(path), FileEdit::Write { content, .. }) => {
                checked.push(FileEdit::Write { path, content })
            }
            (Ok(path), FileEdit::Delete { .. }) => checked.push(FileEdit::Delete { path }),
            (Err(v), _) => violations.push(v.to_string()),
        }
    }

    if violations.is_empty() {
        Ok(AgentResponse::EditSet {
            rationale,
            edits: checked,
            complete,
        })
    } else {
        Err(format!(
            "edits outside the allowed scope ({}): {}",
            guard.patterns().join(", "),
            violations.join("; ")
        ))
    }
}

async fn apply_edits(workspace: &Workspace, edits: &[FileEdit]) -> Result<Vec<String>> {
    let mut touched = Vec::new();
    for edit in edits {
        match edit {
            FileEdit::Write { path, content } => {
                write_file(&workspace.path, path, content).await?;
                touched.push(path.clone());
            }
            FileEdit::Delete { path } => {
                if delete_file(&workspace.path, path).await? {
                    touched.push(path.clone());
                }
            }
        }
    }
    Ok(touched)
}

fn failure_reason(error: &AetherError, retries: u32) -> String {
    let attempts = retries + 1;
    match error {
        AetherError::Transport(e) if e.is_configuration() => {
            format!("the model endpoint rejected the configured credentials ({})", e)
        }
        AetherError::Transport(e) => {
            format!("the model endpoint kept failing after {} attempt(s): {}", attempts, e)
        }
        AetherError::Execution(reason) => format!("{} (after {} attempt(s))", reason, attempts),
        other => format!("{} (after {} attempt(s))", other, attempts),
    }
}

fn list_or_none(files: &[String]) -> String {
    if files.is_empty() {
        "none".to_string()
    } else {
        files.join(", ")
    }
}

fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(2000).collect();
    if out.len() < text.len() {
        out.push_str("\n...");
    }
    out
}
