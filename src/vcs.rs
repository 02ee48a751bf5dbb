//! Version-control adapter.
//!
//! [`VersionControl`] is the narrow surface the orchestration core uses;
//! [`GitRepository`] implements it with one worktree per task branch.
//! Operations that touch the main checkout or shared refs (worktree add and
//! remove, checkout + merge, branch deletion) are serialized per repository.
//! Commits run inside a task's own worktree and are not serialized.

use crate::error::{AetherError, Result};
use crate::git::{get_repo_root, git_succeeds, rev_parse, run_git};
use crate::git_worktree::{
    FileTree, MergeAttempt, TreeLimits, cleanup_task_worktree, merge_branch, reset_worktree,
    setup_task_worktree, snapshot_tree, task_worktree_path,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// An isolated checkout of one task branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub branch: String,
    pub path: PathBuf,
    /// Whether the checkout existed before this call.
    pub reused: bool,
}

#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Root of the main checkout.
    fn root(&self) -> &Path;

    /// Create `name` from `from` (or reuse it) and return its isolated checkout.
    async fn branch(&self, name: &str, from: &str) -> Result<Workspace>;

    /// Throw away uncommitted changes in a workspace.
    async fn reset(&self, workspace: &Workspace) -> Result<()>;

    /// Stage everything and commit. `Ok(None)` when there was nothing to commit.
    async fn commit(&self, workspace: &Workspace, message: &str) -> Result<Option<String>>;

    /// Merge `branch` into `into` with a merge commit, aborting on conflict.
    async fn merge(&self, branch: &str, into: &str, message: &str) -> Result<MergeAttempt>;

    /// Commit SHA a branch points at.
    async fn head(&self, branch: &str) -> Result<String>;

    /// Bounded listing of the main checkout.
    async fn list_files(&self, limits: TreeLimits) -> Result<FileTree>;

    /// Remove a branch's workspace; delete the branch too when asked.
    async fn release(&self, branch: &str, delete_branch: bool) -> Result<()>;
}

/// Git-backed [`VersionControl`].
pub struct GitRepository {
    root: PathBuf,
    worktrees_dir: PathBuf,
    skip_paths: Vec<PathBuf>,
    root_lock: Mutex<()>,
}

impl GitRepository {
    /// Open the repository containing `path`.
    ///
    /// # Returns
    ///
    /// * `Ok(GitRepository)` - The repository with at least one commit
    /// * `Err(AetherError::Configuration)` - `path` is not inside a usable repository
    pub async fn open<P: AsRef<Path>>(path: P, worktrees_dir: PathBuf) -> Result<Self> {
        let root = get_repo_root(path).await?;

        if !git_succeeds(&root, &["rev-parse", "--verify", "--quiet", "HEAD"]).await? {
            return Err(AetherError::Configuration(format!(
                "repository '{}' has no commits; create an initial commit first",
                root.display()
            )));
        }

        let worktrees_dir = if worktrees_dir.is_absolute() {
            worktrees_dir
        } else {
            root.join(worktrees_dir)
        };

        Ok(Self {
            skip_paths: vec![worktrees_dir.clone()],
            root,
            worktrees_dir,
            root_lock: Mutex::new(()),
        })
    }

    /// Additional directories hidden from [`VersionControl::list_files`].
    pub fn with_skip_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.skip_paths.extend(paths);
        self
    }

    pub fn worktrees_dir(&self) -> &Path {
        &self.worktrees_dir
    }
}

#[async_trait]
impl VersionControl for GitRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn branch(&self, name: &str, from: &str) -> Result<Workspace> {
        let path = task_worktree_path(&self.worktrees_dir, name);
        let _guard = self.root_lock.lock().await;
        let info = setup_task_worktree(&self.root, &path, name, from).await?;
        debug!(branch = name, path = %info.path.display(), reused = info.reused, "workspace ready");
        Ok(Workspace {
            branch: info.branch,
            path: info.path,
            reused: info.reused,
        })
    }

    async fn reset(&self, workspace: &Workspace) -> Result<()> {
        ensure_isolated(workspace).await?;
        reset_worktree(&workspace.path).await
    }

    async fn commit(&self, workspace: &Workspace, message: &str) -> Result<Option<String>> {
        ensure_isolated(workspace).await?;
        run_git(&workspace.path, &["add", "-A"]).await?;
        if git_succeeds(&workspace.path, &["diff", "--cached", "--quiet"]).await? {
            return Ok(None);
        }
        run_git(&workspace.path, &["commit", "--quiet", "-m", message]).await?;
        Ok(Some(rev_parse(&workspace.path, "HEAD").await?))
    }

    async fn merge(&self, branch: &str, into: &str, message: &str) -> Result<MergeAttempt> {
        let _guard = self.root_lock.lock().await;
        merge_branch(&self.root, branch, into, message).await
    }

    async fn head(&self, branch: &str) -> Result<String> {
        rev_parse(&self.root, branch).await
    }

    async fn list_files(&self, limits: TreeLimits) -> Result<FileTree> {
        let root = self.root.clone();
        let skip = self.skip_paths.clone();
        tokio::task::spawn_blocking(move || snapshot_tree(&root, limits, &skip))
            .await
            .map_err(|e| AetherError::Git(format!("file listing task failed: {}", e)))?
    }

    async fn release(&self, branch: &str, delete_branch: bool) -> Result<()> {
        let _guard = self.root_lock.lock().await;
        cleanup_task_worktree(&self.root, branch, delete_branch).await
    }
}

/// Refuse to run index-touching commands unless git resolves the workspace
/// as its own top level. A worktree that lost its `.git` link resolves to the
/// enclosing main checkout instead.
async fn ensure_isolated(workspace: &Workspace) -> Result<()> {
    let toplevel = run_git(&workspace.path, &["rev-parse", "--show-toplevel"]).await?;
    let canonical = |path: PathBuf| async move {
        tokio::fs::canonicalize(&path)
            .await
            .map_err(|e| AetherError::Git(format!("cannot resolve '{}': {}", path.display(), e)))
    };
    let expected = canonical(workspace.path.clone()).await?;
    let actual = canonical(PathBuf::from(&toplevel.stdout)).await?;
    if actual != expected {
        return Err(AetherError::Git(format!(
            "workspace '{}' is no longer an isolated worktree (git resolves it to '{}')",
            workspace.path.display(),
            actual.display()
        )));
    }
    Ok(())
}
