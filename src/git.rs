//! Git command runner for aether.
//!
//! Async wrapper around the `git` binary with captured stdout/stderr and
//! structured errors. All git operations go through this module.

use crate::error::{AetherError, Result};
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

/// Result of a successful git command execution.
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Standard output from the command (trimmed).
    pub stdout: String,
    /// Standard error from the command (trimmed).
    pub stderr: String,
}

impl GitOutput {
    fn from_output(output: &Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    /// Returns true if stdout is empty.
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty()
    }

    /// Returns stdout lines as a vector.
    pub fn lines(&self) -> Vec<&str> {
        if self.stdout.is_empty() {
            Vec::new()
        } else {
            self.stdout.lines().collect()
        }
    }

    /// The more informative of stderr and stdout.
    fn message(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Run a git command with the specified working directory.
///
/// # Arguments
///
/// * `cwd` - The working directory to run the command in
/// * `args` - The git command arguments (without "git" prefix)
///
/// # Returns
///
/// * `Ok(GitOutput)` - On successful execution (exit code 0)
/// * `Err(AetherError::Git)` - On spawn failure or non-zero exit code
pub async fn run_git<P: AsRef<Path>>(cwd: P, args: &[&str]) -> Result<GitOutput> {
    let (success, exit_code, output) = run_git_unchecked(cwd, args).await?;

    if success {
        Ok(output)
    } else {
        Err(AetherError::Git(format!(
            "git {} failed (exit code {}): {}",
            args.first().unwrap_or(&""),
            exit_code,
            output.message()
        )))
    }
}

/// Run a git command and report success as a boolean instead of an error.
///
/// For queries whose non-zero exit is an answer (`rev-parse --verify`,
/// `diff --quiet`) rather than a failure.
pub async fn git_succeeds<P: AsRef<Path>>(cwd: P, args: &[&str]) -> Result<bool> {
    let (success, _, _) = run_git_unchecked(cwd, args).await?;
    Ok(success)
}

async fn run_git_unchecked<P: AsRef<Path>>(
    cwd: P,
    args: &[&str],
) -> Result<(bool, i32, GitOutput)> {
    let output = Command::new("git")
        .current_dir(cwd.as_ref())
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            AetherError::Git(format!(
                "failed to execute git {}: {}",
                args.first().unwrap_or(&""),
                e
            ))
        })?;

    let git_output = GitOutput::from_output(&output);
    Ok((
        output.status.success(),
        output.status.code().unwrap_or(-1),
        git_output,
    ))
}

/// Get the repository root directory using `git rev-parse --show-toplevel`.
///
/// # Returns
///
/// * `Ok(PathBuf)` - The absolute path to the repository root
/// * `Err(AetherError::Configuration)` - If `cwd` is not inside a git repository
pub async fn get_repo_root<P: AsRef<Path>>(cwd: P) -> Result<PathBuf> {
    let cwd = cwd.as_ref();
    if !cwd.is_dir() {
        return Err(AetherError::Configuration(format!(
            "repository path '{}' does not exist or is not a directory",
            cwd.display()
        )));
    }

    let (success, _, output) =
        run_git_unchecked(cwd, &["rev-parse", "--show-toplevel"]).await?;
    if success {
        Ok(PathBuf::from(&output.stdout))
    } else {
        Err(AetherError::Configuration(format!(
            "'{}' is not inside a git repository: {}",
            cwd.display(),
            output.message()
        )))
    }
}

/// Resolve a revision (branch, tag, `HEAD`) to a commit SHA.
pub async fn rev_parse<P: AsRef<Path>>(cwd: P, rev: &str) -> Result<String> {
    let output = run_git(cwd, &["rev-parse", "--verify", &format!("{}^{{commit}}", rev)]).await?;
    Ok(output.stdout)
}

/// Check if the working directory has any uncommitted changes, untracked
/// files included.
pub async fn has_changes<P: AsRef<Path>>(cwd: P) -> Result<bool> {
    let output = run_git(cwd, &["status", "--porcelain"]).await?;
    Ok(!output.is_empty())
}
