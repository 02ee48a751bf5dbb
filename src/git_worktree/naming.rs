//! Branch naming and path utilities for task worktrees.

use crate::model::{MissionId, TaskId};
use std::path::{Path, PathBuf};

/// Generate the branch name for a task.
///
/// Format: `agent/mission-{mission}/task-{task}` with both ids in 32-hex form.
/// The mapping is injective, so distinct tasks never share a branch, even
/// across missions.
pub fn task_branch_name(mission_id: MissionId, task_id: TaskId) -> String {
    format!(
        "agent/mission-{}/task-{}",
        mission_id.simple(),
        task_id.simple()
    )
}

/// Generate the worktree directory for a task branch.
///
/// Format: `{worktrees_dir}/agent-mission-{mission}-task-{task}/`
pub fn task_worktree_path(worktrees_dir: &Path, branch: &str) -> PathBuf {
    worktrees_dir.join(sanitize_slug(branch))
}

/// Sanitize a string for use as a single path component or branch segment.
///
/// Lowercases ASCII alphanumerics and collapses every other run of
/// characters into one hyphen, with no leading or trailing hyphen.
pub(crate) fn sanitize_slug(s: &str) -> String {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}
