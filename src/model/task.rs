//! Task records and their lifecycle.
//!
//! ```text
//! pending -> running -> succeeded
//!                  \--> failed
//! ```
//!
//! Retries happen while the task stays `running`; `failed` is only reached
//! once the retry bound is exhausted.

use super::ids::{AgentId, MissionId, TaskId};
use crate::error::{AetherError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status shared by tasks and the agents that execute them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }

    fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Pending, TaskStatus::Failed)
                | (TaskStatus::Running, TaskStatus::Succeeded)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Succeeded => write!(f, "succeeded"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One unit of work planned for a mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub mission_id: MissionId,
    /// Zero-based position in the plan. Merge order follows it.
    pub position: usize,
    pub title: String,
    pub description: String,
    /// Glob patterns the task may edit. Empty means any repository path.
    #[serde(default)]
    pub file_scope: Vec<String>,
    #[serde(default)]
    pub agent_id: Option<AgentId>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub files_changed: Vec<String>,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub failure: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        mission_id: MissionId,
        position: usize,
        title: impl Into<String>,
        description: impl Into<String>,
        file_scope: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            mission_id,
            position,
            title: title.into(),
            description: description.into(),
            file_scope,
            agent_id: None,
            status: TaskStatus::Pending,
            retry_count: 0,
            branch: None,
            files_changed: Vec::new(),
            commit: None,
            summary: None,
            failure: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bind the executing agent. An agent can be bound exactly once.
    pub fn assign_agent(&mut self, agent_id: AgentId, branch: impl Into<String>) -> Result<()> {
        if let Some(existing) = self.agent_id {
            return Err(AetherError::State(format!(
                "task {} is already assigned to agent {}",
                self.id, existing
            )));
        }
        self.agent_id = Some(agent_id);
        self.branch = Some(branch.into());
        self.touch();
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.transition(TaskStatus::Running)
    }

    /// Count another attempt on the same agent and branch.
    pub fn record_retry(&mut self) -> Result<()> {
        if self.status != TaskStatus::Running {
            return Err(AetherError::State(format!(
                "task {} cannot be retried while {}",
                self.id, self.status
            )));
        }
        self.retry_count += 1;
        self.touch();
        Ok(())
    }

    pub fn succeed(
        &mut self,
        files_changed: Vec<String>,
        commit: Option<String>,
        summary: impl Into<String>,
    ) -> Result<()> {
        self.transition(TaskStatus::Succeeded)?;
        self.files_changed = files_changed;
        self.commit = commit;
        self.summary = Some(summary.into());
        self.failure = None;
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(TaskStatus::Failed)?;
        self.failure = Some(reason.into());
        Ok(())
    }

    fn transition(&mut self, next: TaskStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AetherError::State(format!(
                "task {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
