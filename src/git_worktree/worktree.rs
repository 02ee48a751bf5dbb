//! Worktree creation, listing, and reset.

use crate::error::{AetherError, Result};
use crate::git::{rev_parse, run_git};
use std::path::{Path, PathBuf};

use super::branch::branch_exists;

/// A checked-out task branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeInfo {
    /// Absolute path to the worktree directory.
    pub path: PathBuf,
    /// Name of the task branch.
    pub branch: String,
    /// Commit the branch pointed at when the worktree was prepared.
    pub head_sha: String,
    /// Whether the worktree already existed.
    pub reused: bool,
}

/// An entry of `git worktree list --porcelain`.
#[derive(Debug, Clone)]
pub struct ExistingWorktree {
    pub path: PathBuf,
    /// `None` for a detached HEAD.
    pub branch: Option<String>,
    pub head_sha: String,
}

/// List all worktrees in the repository.
pub async fn list_worktrees<P: AsRef<Path>>(repo_root: P) -> Result<Vec<ExistingWorktree>> {
    let output = run_git(repo_root, &["worktree", "list", "--porcelain"]).await?;
    Ok(parse_worktree_list(&output.stdout))
}

/// Parse porcelain output; records are separated by blank lines.
fn parse_worktree_list(porcelain: &str) -> Vec<ExistingWorktree> {
    porcelain
        .split("\n\n")
        .filter_map(|record| {
            let mut path = None;
            let mut head = None;
            let mut branch = None;
            for line in record.lines() {
                if let Some(p) = line.strip_prefix("worktree ") {
                    path = Some(PathBuf::from(p));
                } else if let Some(sha) = line.strip_prefix("HEAD ") {
                    head = Some(sha.to_string());
                } else if let Some(branch_ref) = line.strip_prefix("branch ") {
                    branch = branch_ref.strip_prefix("refs/heads/").map(String::from);
                }
            }
            Some(ExistingWorktree {
                path: path?,
                branch,
                head_sha: head?,
            })
        })
        .collect()
}

/// Find an existing worktree for a branch.
pub async fn find_worktree_for_branch<P: AsRef<Path>>(
    repo_root: P,
    branch: &str,
) -> Result<Option<ExistingWorktree>> {
    let worktrees = list_worktrees(repo_root).await?;

    Ok(worktrees
        .into_iter()
        .find(|wt| wt.branch.as_deref() == Some(branch)))
}

/// Create or reuse the worktree for `branch`.
///
/// - branch checked out in a worktree: reuse it
/// - branch exists without a worktree: attach a new worktree at `worktree_path`
/// - branch missing: create it from `from` together with the worktree
///
/// # Returns
///
/// * `Ok(WorktreeInfo)` - The worktree to work in
/// * `Err(AetherError::Git)` - Any git failure
pub async fn setup_task_worktree<P: AsRef<Path>>(
    repo_root: P,
    worktree_path: &Path,
    branch: &str,
    from: &str,
) -> Result<WorktreeInfo> {
    let repo_root = repo_root.as_ref();

    if let Some(existing) = find_worktree_for_branch(repo_root, branch).await? {
        return Ok(WorktreeInfo {
            path: existing.path,
            branch: branch.to_string(),
            head_sha: existing.head_sha,
            reused: true,
        });
    }

    if let Some(parent) = worktree_path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            AetherError::Git(format!(
                "failed to create worktrees directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let worktree_str = worktree_path.to_string_lossy();
    let args: Vec<&str> = if branch_exists(repo_root, branch).await? {
        vec!["worktree", "add", &worktree_str, branch]
    } else {
        vec!["worktree", "add", "-b", branch, &worktree_str, from]
    };

    run_git(repo_root, &args).await.map_err(|e| {
        AetherError::Git(format!(
            "failed to create worktree at '{}' for branch '{}': {}",
            worktree_str, branch, e
        ))
    })?;

    Ok(WorktreeInfo {
        path: worktree_path.to_path_buf(),
        branch: branch.to_string(),
        head_sha: rev_parse(worktree_path, "HEAD").await?,
        reused: false,
    })
}

/// Discard uncommitted edits and untracked files in a worktree.
pub async fn reset_worktree(worktree_path: &Path) -> Result<()> {
    run_git(worktree_path, &["reset", "--hard", "HEAD"]).await?;
    run_git(worktree_path, &["clean", "-fd"]).await?;
    Ok(())
}
