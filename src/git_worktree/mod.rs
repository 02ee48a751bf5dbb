//! Git worktree and task branch helpers for aether.
//!
//! This module provides the git operations behind branch-per-task isolation:
//!
//! - Deriving branch names and worktree paths from mission and task ids
//! - Creating/reusing task worktrees and resetting them between attempts
//! - Merging task branches into the base branch with conflict abort
//! - Removing worktrees and deleting merged branches
//! - Bounded file tree snapshots for planning
//!
//! All git failures are reported as `AetherError::Git`.

mod branch;
mod cleanup;
mod merge;
mod naming;
mod tree;
mod worktree;

// Re-export public API
pub use branch::{branch_exists, delete_branch};
pub use cleanup::{cleanup_task_worktree, remove_worktree};
pub use merge::{MergeAttempt, merge_branch};
pub use naming::{task_branch_name, task_worktree_path};
pub use tree::{FileTree, SKIPPED_DIRS, TreeEntry, TreeLimits, snapshot_tree};
pub use worktree::{
    ExistingWorktree, WorktreeInfo, find_worktree_for_branch, list_worktrees, reset_worktree,
    setup_task_worktree,
};
