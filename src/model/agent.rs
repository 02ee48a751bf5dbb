//! Agent records.

use super::ids::{AgentId, MissionId, TaskId};
use super::task::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The worker bound to one task. Its status mirrors the task's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub mission_id: MissionId,
    pub task_id: TaskId,
    pub name: String,
    /// Model identifier used for this agent's completions.
    pub model: String,
    pub branch: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub retired_at: Option<DateTime<Utc>>,
}

impl Agent {
    pub fn new(
        mission_id: MissionId,
        task_id: TaskId,
        model: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        let id = AgentId::new();
        Self {
            name: format!("agent-{}", &id.simple()[..6]),
            id,
            mission_id,
            task_id,
            model: model.into(),
            branch: branch.into(),
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            retired_at: None,
        }
    }

    /// Copy the task's status; a terminal status retires the agent.
    pub fn mirror(&mut self, status: TaskStatus) {
        self.status = status;
        if status.is_terminal() && self.retired_at.is_none() {
            self.retired_at = Some(Utc::now());
        }
    }
}
