//! Merge coordination: integrating task branches into the mission base.
//!
//! Branches merge one at a time in planned task order, not completion order.
//! A conflict is aborted and recorded; later tasks still merge. If an abort
//! ever fails to restore the base branch, no further merges are attempted.

use crate::error::AetherError;
use crate::git_worktree::MergeAttempt;
use crate::model::{MergeRecord, MergeResult, Task, TaskStatus};
use crate::vcs::VersionControl;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of merging one mission's tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// One record per task, in planned order.
    pub results: Vec<MergeRecord>,
    /// A failed merge abort left the base branch unclean.
    pub base_broken: bool,
}

impl MergeReport {
    pub fn merged_count(&self) -> usize {
        self.results.iter().filter(|r| r.result.is_merged()).count()
    }
}

pub struct MergeCoordinator {
    vcs: Arc<dyn VersionControl>,
}

impl MergeCoordinator {
    pub fn new(vcs: Arc<dyn VersionControl>) -> Self {
        Self { vcs }
    }

    /// Merge every succeeded task into `base_branch`; skip the rest.
    pub async fn merge_all(&self, base_branch: &str, tasks: &[Task]) -> MergeReport {
        let mut ordered: Vec<&Task> = tasks.iter().collect();
        ordered.sort_by_key(|t| t.position);

        let mut base_broken = false;
        let mut results = Vec::with_capacity(ordered.len());

        for task in ordered {
            let result = if base_broken {
                MergeResult::Skipped {
                    reason: "an earlier merge left the base branch unclean".to_string(),
                }
            } else {
                match (task.status, task.branch.as_deref()) {
                    (TaskStatus::Succeeded, Some(branch)) => {
                        let (result, broken) = self.merge_one(base_branch, task, branch).await;
                        base_broken = broken;
                        result
                    }
                    (TaskStatus::Succeeded, None) => MergeResult::Skipped {
                        reason: "task has no branch".to_string(),
                    },
                    _ => MergeResult::Skipped {
                        reason: task
                            .failure
                            .clone()
                            .unwrap_or_else(|| format!("task {}", task.status)),
                    },
                }
            };

            results.push(MergeRecord {
                task_id: task.id,
                task_title: task.title.clone(),
                result,
            });
        }

        MergeReport {
            results,
            base_broken,
        }
    }

    async fn merge_one(&self, base_branch: &str, task: &Task, branch: &str) -> (MergeResult, bool) {
        let message = format!("Merge {}: {}", branch, task.title);
        match self.vcs.merge(branch, base_branch, &message).await {
            Ok(MergeAttempt::Merged { commit }) => {
                info!(task_id = %task.id, branch, commit = %commit, "task branch merged");
                (
                    MergeResult::Merged {
                        commit: Some(commit),
                    },
                    false,
                )
            }
            Ok(MergeAttempt::Conflict {
                detail,
                base_intact,
            }) => {
                let conflict = AetherError::MergeConflict {
                    branch: branch.to_string(),
                    detail: detail.clone(),
                };
                if base_intact {
                    warn!(task_id = %task.id, error = %conflict, "merge aborted");
                } else {
                    error!(task_id = %task.id, error = %conflict, "merge abort failed; base branch unclean");
                }
                (MergeResult::Conflict { detail }, !base_intact)
            }
            Err(e) => {
                warn!(task_id = %task.id, branch, error = %e, "merge could not be attempted");
                (
                    MergeResult::Conflict {
                        detail: e.to_string(),
                    },
                    false,
                )
            }
        }
    }
}
