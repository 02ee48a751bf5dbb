//! Cleanup operations for worktrees and branches.

use crate::error::{AetherError, Result};
use crate::git::run_git;
use std::path::Path;

use super::branch::{branch_exists, delete_branch};
use super::worktree::find_worktree_for_branch;

/// Remove a worktree.
///
/// # Arguments
///
/// * `repo_root` - Path to the repository root
/// * `worktree_path` - Path to the worktree to remove
/// * `force` - If true, use --force (required if the worktree has uncommitted changes)
pub async fn remove_worktree<P: AsRef<Path>>(
    repo_root: P,
    worktree_path: &Path,
    force: bool,
) -> Result<()> {
    let worktree_str = worktree_path.to_string_lossy();

    let mut args = vec!["worktree", "remove"];
    if force {
        args.push("--force");
    }
    args.push(worktree_str.as_ref());

    run_git(repo_root, &args).await.map_err(|e| {
        AetherError::Git(format!(
            "failed to remove worktree '{}': {}",
            worktree_str, e
        ))
    })?;

    Ok(())
}

/// Remove a task's worktree and optionally its branch.
///
/// Missing worktrees and branches are not errors. Branches are only deleted
/// with `delete_branch`, and then with a safe (merged-only) delete.
pub async fn cleanup_task_worktree<P: AsRef<Path>>(
    repo_root: P,
    branch: &str,
    delete_branch_too: bool,
) -> Result<()> {
    let repo_root = repo_root.as_ref();

    if let Some(existing) = find_worktree_for_branch(repo_root, branch).await? {
        remove_worktree(repo_root, &existing.path, true).await?;
    }
    run_git(repo_root, &["worktree", "prune"]).await?;

    if delete_branch_too && branch_exists(repo_root, branch).await? {
        delete_branch(repo_root, branch, false).await?;
    }

    Ok(())
}
