//! Mission records and their lifecycle.
//!
//! ```text
//! queued -> active -> completed
//!    \         \--> failed
//!     \--> failed
//! ```

use super::ids::{MissionId, TaskId};
use super::merge::MergeRecord;
use super::task::Task;
use crate::error::{AetherError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    #[default]
    Queued,
    Active,
    Completed,
    Failed,
}

impl MissionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MissionStatus::Completed | MissionStatus::Failed)
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissionStatus::Queued => write!(f, "queued"),
            MissionStatus::Active => write!(f, "active"),
            MissionStatus::Completed => write!(f, "completed"),
            MissionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A user request decomposed into tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub session_id: String,
    pub title: String,
    /// The user request, verbatim.
    pub description: String,
    pub status: MissionStatus,
    pub base_branch: String,
    /// Task ids in planned order.
    #[serde(default)]
    pub task_ids: Vec<TaskId>,
    #[serde(default)]
    pub plan_summary: Option<String>,
    #[serde(default)]
    pub merge_results: Vec<MergeRecord>,
    #[serde(default)]
    pub failure: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Mission {
    pub fn new(
        session_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        base_branch: impl Into<String>,
    ) -> Self {
        Self {
            id: MissionId::new(),
            session_id: session_id.into(),
            title: title.into(),
            description: description.into(),
            status: MissionStatus::Queued,
            base_branch: base_branch.into(),
            task_ids: Vec::new(),
            plan_summary: None,
            merge_results: Vec::new(),
            failure: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Move to `active`. Tasks must already be attached.
    pub fn start(&mut self) -> Result<()> {
        self.expect_status(MissionStatus::Queued, MissionStatus::Active)?;
        self.status = MissionStatus::Active;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Move to `completed`. Every task must be terminal and at least one merged.
    pub fn complete(&mut self, tasks: &[Task]) -> Result<()> {
        self.expect_status(MissionStatus::Active, MissionStatus::Completed)?;
        if let Some(open) = tasks.iter().find(|t| !t.status.is_terminal()) {
            return Err(AetherError::State(format!(
                "mission {} cannot complete while task '{}' is {}",
                self.id, open.title, open.status
            )));
        }
        if !self.merge_results.iter().any(|r| r.result.is_merged()) {
            return Err(AetherError::State(format!(
                "mission {} cannot complete without a merged task",
                self.id
            )));
        }
        self.status = MissionStatus::Completed;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Move to `failed` from any non-terminal status.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        if self.status.is_terminal() {
            return Err(AetherError::State(format!(
                "mission {} is already {}",
                self.id, self.status
            )));
        }
        self.status = MissionStatus::Failed;
        self.failure = Some(reason.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn expect_status(&self, expected: MissionStatus, next: MissionStatus) -> Result<()> {
        if self.status != expected {
            return Err(AetherError::State(format!(
                "mission {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        Ok(())
    }
}
