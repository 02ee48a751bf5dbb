//! Orchestration mode: plan a request, run its tasks, merge the results.

use super::Orchestrator;
use super::narration::{self, CONFIGURATION_REPLY};
use crate::agent::{ExecutorLimits, SubAgentExecutor, TaskOutcome};
use crate::audit;
use crate::error::{AetherError, Result};
use crate::git_worktree::{TreeLimits, task_branch_name};
use crate::merge::{MergeCoordinator, MergeReport};
use crate::model::{Agent, Mission, Task};
use crate::planner::{Plan, TaskPlanner};
use crate::vcs::VersionControl;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

const MAX_TITLE_CHARS: usize = 72;

impl Orchestrator {
    #[instrument(skip(self, request, vcs))]
    pub(super) async fn orchestrate(
        &self,
        session_id: &str,
        request: &str,
        vcs: Arc<dyn VersionControl>,
    ) -> String {
        let tree = match vcs.list_files(self.tree_limits()).await {
            Ok(tree) => tree,
            Err(e) => {
                error!(error = %e, "failed to snapshot repository");
                return narration::planning_failure(&e);
            }
        };

        let planner = TaskPlanner::new(
            self.llm.clone(),
            self.config.llm.timeout(),
            self.config.max_task_retries,
        )
        .with_backoff(self.retry_backoff);

        let plan = match planner.plan(request, &tree).await {
            Ok(plan) => plan,
            Err(e) if e.is_configuration() => {
                error!(error = %e, "planning rejected by the model endpoint");
                return CONFIGURATION_REPLY.to_string();
            }
            Err(e) => return self.fail_planning(session_id, request, e).await,
        };

        if plan.tasks.is_empty() {
            info!("plan has no tasks; answering directly");
            return self.converse(session_id, request, Some(&tree)).await;
        }

        match self.run_mission(session_id, request, plan, vcs).await {
            Ok(reply) => {
                self.record_exchange(session_id, request, &reply).await;
                reply
            }
            Err(e) => {
                error!(error = %e, "mission could not be started");
                narration::planning_failure(&e)
            }
        }
    }

    /// Record a mission that failed before any task existed.
    async fn fail_planning(&self, session_id: &str, request: &str, cause: AetherError) -> String {
        warn!(error = %cause, "planning failed");
        let started = Instant::now();
        let mut mission = Mission::new(
            session_id,
            derive_title(request),
            request,
            &self.config.base_branch,
        );
        if let Err(e) = mission.fail(cause.to_string()) {
            error!(error = %e, "mission could not be marked failed");
        }
        if let Err(e) = self.store.save_mission(&mission).await {
            error!(mission_id = %mission.id, error = %e, "failed to persist mission");
        }
        audit::record(
            "mission summary",
            self.audit
                .write_mission_summary(&mission, &[], &[], started.elapsed()),
        )
        .await;

        let reply = narration::planning_failure(&cause);
        self.record_exchange(session_id, request, &reply).await;
        reply
    }

    #[instrument(skip_all, fields(tasks = plan.tasks.len()))]
    async fn run_mission(
        &self,
        session_id: &str,
        request: &str,
        plan: Plan,
        vcs: Arc<dyn VersionControl>,
    ) -> Result<String> {
        let started = Instant::now();
        let title = plan
            .summary
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| derive_title(request));
        let mut mission = Mission::new(session_id, title, request, &self.config.base_branch);
        mission.plan_summary = plan.summary.clone();

        let tasks: Vec<Task> = plan
            .tasks
            .into_iter()
            .enumerate()
            .map(|(position, planned)| {
                Task::new(
                    mission.id,
                    position,
                    planned.title,
                    planned.description,
                    planned.file_scope,
                )
            })
            .collect();
        mission.task_ids = tasks.iter().map(|t| t.id).collect();

        self.store.save_mission(&mission).await?;
        for task in &tasks {
            self.store.save_task(task).await?;
        }
        audit::record(
            "mission overview",
            self.audit.write_mission_overview(&mission, request, &tasks),
        )
        .await;

        mission.start()?;
        self.store.save_mission(&mission).await?;
        info!(mission_id = %mission.id, title = %mission.title, "mission started");

        let outcomes = self.dispatch(&mission, tasks, vcs.clone()).await;
        let finished: Vec<Task> = outcomes.iter().map(|o| o.task.clone()).collect();

        let report = MergeCoordinator::new(vcs.clone())
            .merge_all(&mission.base_branch, &finished)
            .await;
        mission.merge_results = report.results.clone();

        self.release_workspaces(vcs.as_ref(), &finished, &report).await;
        self.finalize(&mut mission, &finished, &report);

        if let Err(e) = self.store.save_mission(&mission).await {
            error!(mission_id = %mission.id, error = %e, "failed to persist mission");
        }
        audit::record(
            "mission summary",
            self.audit.write_mission_summary(
                &mission,
                &finished,
                &mission.merge_results,
                started.elapsed(),
            ),
        )
        .await;
        info!(
            mission_id = %mission.id,
            status = %mission.status,
            merged = report.merged_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "mission finished"
        );

        Ok(narration::mission_report(&mission, &outcomes, &report))
    }

    /// Run every task under the worker-pool bound. Outcomes come back in
    /// planned order.
    async fn dispatch(
        &self,
        mission: &Mission,
        tasks: Vec<Task>,
        vcs: Arc<dyn VersionControl>,
    ) -> Vec<TaskOutcome> {
        let executor = Arc::new(SubAgentExecutor::new(
            self.agent_llm.clone(),
            vcs,
            self.store.clone(),
            self.audit.clone(),
            self.executor_limits(),
        )
        .with_reserved_paths(self.config.reserved_paths()));
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_tasks.max(1)));
        let shared_mission = Arc::new(mission.clone());
        let base_branch = Arc::new(mission.base_branch.clone());

        let mut join_set: JoinSet<(usize, TaskOutcome)> = JoinSet::new();
        for (index, task) in tasks.iter().cloned().enumerate() {
            let executor = executor.clone();
            let semaphore = semaphore.clone();
            let mission = shared_mission.clone();
            let base_branch = base_branch.clone();
            join_set.spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = executor.execute(&mission, task, &base_branch).await;
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<TaskOutcome>> = tasks.iter().map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => error!(error = %e, "task worker terminated"),
            }
        }

        let mut outcomes = Vec::with_capacity(slots.len());
        for (slot, task) in slots.into_iter().zip(tasks) {
            match slot {
                Some(outcome) => outcomes.push(outcome),
                None => outcomes.push(self.abandoned(mission, task).await),
            }
        }
        outcomes
    }

    /// A task whose worker vanished still ends `failed`.
    async fn abandoned(&self, mission: &Mission, mut task: Task) -> TaskOutcome {
        let branch = task_branch_name(mission.id, task.id);
        let mut agent = Agent::new(mission.id, task.id, self.agent_llm.model(), branch.clone());
        let reason = "worker terminated unexpectedly".to_string();
        if let Err(e) = task
            .assign_agent(agent.id, branch)
            .and_then(|()| task.fail(reason.clone()))
        {
            error!(task_id = %task.id, error = %e, "abandoned task could not be marked failed");
        }
        agent.mirror(task.status);
        if let Err(e) = self.store.save_task(&task).await {
            error!(task_id = %task.id, error = %e, "failed to persist task");
        }
        if let Err(e) = self.store.save_agent(&agent).await {
            error!(agent_id = %agent.id, error = %e, "failed to persist agent");
        }
        TaskOutcome {
            task,
            agent,
            files_changed: Vec::new(),
            summary: reason,
            configuration_error: false,
        }
    }

    /// Remove task worktrees. Merged branches are deleted; the rest are kept.
    async fn release_workspaces(&self, vcs: &dyn VersionControl, tasks: &[Task], report: &MergeReport) {
        if !self.config.cleanup_worktrees {
            return;
        }
        for task in tasks {
            let Some(branch) = task.branch.as_deref() else {
                continue;
            };
            let merged = report
                .results
                .iter()
                .any(|r| r.task_id == task.id && r.result.is_merged());
            if let Err(e) = vcs.release(branch, merged).await {
                warn!(branch, error = %e, "failed to clean up task workspace");
            }
        }
    }

    fn finalize(&self, mission: &mut Mission, tasks: &[Task], report: &MergeReport) {
        let result = if report.base_broken {
            mission.fail("a merge abort left the base branch unclean")
        } else if report.merged_count() == 0 {
            mission.fail("no task was merged")
        } else {
            match mission.complete(tasks) {
                Ok(()) => Ok(()),
                Err(e) => {
                    error!(error = %e, "mission could not complete");
                    mission.fail(e.to_string())
                }
            }
        };
        if let Err(e) = result {
            error!(mission_id = %mission.id, error = %e, "mission could not be finalized");
        }
    }

    /// Append the request and reply to the session's conversation.
    async fn record_exchange(&self, session_id: &str, request: &str, reply: &str) {
        if let Err(e) = self.append_exchange(session_id, request, reply).await {
            error!(error = %e, "failed to record conversation");
        }
    }

    fn tree_limits(&self) -> TreeLimits {
        TreeLimits {
            max_depth: self.config.file_tree_max_depth,
            max_entries: self.config.file_tree_max_entries,
        }
    }

    fn executor_limits(&self) -> ExecutorLimits {
        ExecutorLimits {
            max_iterations: self.config.max_agent_iterations,
            max_consecutive_parse_failures: self.config.max_consecutive_parse_failures,
            max_retries: self.config.max_task_retries,
            max_file_bytes: self.config.max_scope_file_bytes,
            timeout: self.config.llm.timeout(),
            tree: self.tree_limits(),
        }
    }
}

/// First line of the request, shortened to a title.
fn derive_title(request: &str) -> String {
    let line = request.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if line.chars().count() <= MAX_TITLE_CHARS {
        return line.to_string();
    }
    let cut: String = line.chars().take(MAX_TITLE_CHARS).collect();
    format!("{}...", cut.trim_end())
}
