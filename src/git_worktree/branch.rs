//! Branch operations (check existence, delete).

use crate::error::{AetherError, Result};
use crate::git::{git_succeeds, run_git};
use std::path::Path;

/// Check if a branch exists locally.
pub async fn branch_exists<P: AsRef<Path>>(repo_root: P, branch: &str) -> Result<bool> {
    git_succeeds(
        repo_root,
        &["rev-parse", "--verify", "--quiet", &format!("refs/heads/{}", branch)],
    )
    .await
}

/// Delete a branch.
///
/// # Arguments
///
/// * `repo_root` - Path to the repository root
/// * `branch` - Name of the branch to delete
/// * `force` - If true, use -D (delete even if not merged)
pub async fn delete_branch<P: AsRef<Path>>(repo_root: P, branch: &str, force: bool) -> Result<()> {
    let delete_flag = if force { "-D" } else { "-d" };

    run_git(repo_root, &["branch", delete_flag, branch])
        .await
        .map_err(|e| AetherError::Git(format!("failed to delete branch '{}': {}", branch, e)))?;

    Ok(())
}
