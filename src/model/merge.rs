//! Per-task merge results.

use super::ids::TaskId;
use serde::{Deserialize, Serialize};

/// Outcome of integrating one task branch into the mission's base branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MergeResult {
    /// The branch was merged; `commit` is the resulting merge commit.
    Merged { commit: Option<String> },
    /// The merge conflicted and was aborted.
    Conflict { detail: String },
    /// The branch was never merged.
    Skipped { reason: String },
}

impl MergeResult {
    pub fn is_merged(&self) -> bool {
        matches!(self, MergeResult::Merged { .. })
    }

    /// Short lowercase label: `merged`, `conflict`, or `skipped`.
    pub fn label(&self) -> &'static str {
        match self {
            MergeResult::Merged { .. } => "merged",
            MergeResult::Conflict { .. } => "conflict",
            MergeResult::Skipped { .. } => "skipped",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            MergeResult::Merged { .. } => None,
            MergeResult::Conflict { detail } => Some(detail),
            MergeResult::Skipped { reason } => Some(reason),
        }
    }
}

/// A merge result tied to the task it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRecord {
    pub task_id: TaskId,
    pub task_title: String,
    pub result: MergeResult,
}
