//! Merging task branches into a target branch in the main worktree.

use crate::error::{AetherError, Result};
use crate::git::{git_succeeds, rev_parse, run_git};
use std::path::Path;

/// Result of one merge attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeAttempt {
    /// Merged; `commit` is the new head of the target branch.
    Merged { commit: String },
    /// The merge stopped on conflicts and was aborted. `base_intact` is false
    /// when the abort failed and the target branch is left mid-merge.
    Conflict { detail: String, base_intact: bool },
}

/// Merge `branch` into `into` with a merge commit.
///
/// Checks out `into` in `repo_root`, runs `git merge --no-ff`, and on conflict
/// collects the conflicting paths and runs `git merge --abort`.
///
/// # Returns
///
/// * `Ok(MergeAttempt)` - Merged or conflicted
/// * `Err(AetherError::Git)` - The merge could not be attempted; `into` is unchanged
pub async fn merge_branch<P: AsRef<Path>>(
    repo_root: P,
    branch: &str,
    into: &str,
    message: &str,
) -> Result<MergeAttempt> {
    let repo_root = repo_root.as_ref();

    run_git(repo_root, &["checkout", "--quiet", into])
        .await
        .map_err(|e| AetherError::Git(format!("failed to check out '{}': {}", into, e)))?;
    let before = rev_parse(repo_root, "HEAD").await?;

    let merge_err = match run_git(repo_root, &["merge", "--no-ff", "-m", message, branch]).await {
        Ok(_) => {
            return Ok(MergeAttempt::Merged {
                commit: rev_parse(repo_root, "HEAD").await?,
            });
        }
        Err(e) => e,
    };

    let in_progress =
        git_succeeds(repo_root, &["rev-parse", "-q", "--verify", "MERGE_HEAD"]).await?;
    if !in_progress {
        // Refused before touching the tree (unknown branch, dirty checkout).
        return Err(AetherError::Git(format!(
            "failed to merge '{}' into '{}': {}",
            branch, into, merge_err
        )));
    }

    let detail = conflict_detail(repo_root, &merge_err).await;
    if run_git(repo_root, &["merge", "--abort"]).await.is_err() {
        return Ok(MergeAttempt::Conflict {
            detail,
            base_intact: false,
        });
    }

    let after = rev_parse(repo_root, "HEAD").await?;
    let tracked_changes = run_git(
        repo_root,
        &["status", "--porcelain", "--untracked-files=no"],
    )
    .await?;

    Ok(MergeAttempt::Conflict {
        detail,
        base_intact: after == before && tracked_changes.is_empty(),
    })
}

async fn conflict_detail(repo_root: &Path, merge_err: &AetherError) -> String {
    match run_git(repo_root, &["diff", "--name-only", "--diff-filter=U"]).await {
        Ok(output) if !output.is_empty() => {
            format!("conflicting files: {}", output.lines().join(", "))
        }
        _ => merge_err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{commit_file_on_branch, create_test_repo};

    #[tokio::test]
    async fn test_clean_merge_advances_base() {
        let repo = create_test_repo();
        let path = repo.path();
        let before = rev_parse(path, "main").await.unwrap();
        commit_file_on_branch(path, "agent/a", "a.txt", "A\n");

        let attempt = merge_branch(path, "agent/a", "main", "Merge agent/a")
            .await
            .unwrap();
        let MergeAttempt::Merged { commit } = attempt else {
            panic!("expected merge, got {:?}", attempt);
        };
        assert_ne!(commit, before);
        assert_eq!(rev_parse(path, "main").await.unwrap(), commit);
        assert!(path.join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_conflict_is_aborted_and_base_unchanged() {
        let repo = create_test_repo();
        let path = repo.path();
        commit_file_on_branch(path, "agent/one", "README.md", "one\n");
        commit_file_on_branch(path, "agent/two", "README.md", "two\n");

        merge_branch(path, "agent/one", "main", "Merge one")
            .await
            .unwrap();
        let head = rev_parse(path, "main").await.unwrap();

        let attempt = merge_branch(path, "agent/two", "main", "Merge two")
            .await
            .unwrap();
        match attempt {
            MergeAttempt::Conflict {
                detail,
                base_intact,
            } => {
                assert!(base_intact);
                assert!(detail.contains("README.md"), "detail: {}", detail);
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(rev_parse(path, "main").await.unwrap(), head);
        assert_eq!(std::fs::read_to_string(path.join("README.md")).unwrap(), "one\n");
    }

    #[tokio::test]
    async fn test_unknown_branch_is_git_error() {
        let repo = create_test_repo();
        let err = merge_branch(repo.path(), "agent/missing", "main", "m")
            .await
            .unwrap_err();
        assert!(matches!(err, AetherError::Git(_)));
    }
}
