//! Implementation of the `aether missions` and `aether show` commands.
//!
//! Both read recorded state only; no model or repository is touched.

use super::{Wiring, build_orchestrator, load_config, parse_id};
use crate::cli::ShowArgs;
use crate::error::{AetherError, Result};
use crate::model::{Mission, MissionId, Task};
use crate::orchestrator::Orchestrator;
use std::path::Path;

const RULE: &str =
    "================================================================================";

/// Execute the `aether missions` command.
pub async fn cmd_missions(config_path: &Path) -> Result<()> {
    let orchestrator = read_only(config_path).await?;
    let missions = orchestrator.missions().await?;

    if missions.is_empty() {
        println!("No missions recorded.");
        return Ok(());
    }

    println!("{:<36}  {:<9}  {:>5}  TITLE", "ID", "STATUS", "TASKS");
    for mission in &missions {
        println!(
            "{:<36}  {:<9}  {:>5}  {}",
            mission.id,
            mission.status.to_string(),
            mission.task_ids.len(),
            mission.title
        );
    }
    println!();
    println!("{} mission(s). Use `aether show <id>` for details.", missions.len());
    Ok(())
}

/// Execute the `aether show` command.
pub async fn cmd_show(config_path: &Path, args: ShowArgs) -> Result<()> {
    let id: MissionId = parse_id(&args.mission_id, "mission")?;
    let orchestrator = read_only(config_path).await?;

    let mission = orchestrator.mission(id).await?.ok_or_else(|| {
        AetherError::UserError(format!(
            "mission '{}' not found.\n\nUse `aether missions` to list missions.",
            id
        ))
    })?;
    let tasks = orchestrator.tasks(id).await?;

    print_mission(&mission);
    for task in &tasks {
        print_task(&orchestrator, task).await?;
    }
    print_merges(&mission);
    Ok(())
}

async fn read_only(config_path: &Path) -> Result<Orchestrator> {
    let config = load_config(config_path)?;
    build_orchestrator(config, Wiring::ReadOnly).await
}

fn print_mission(mission: &Mission) {
    println!("{}", RULE);
    println!("{} [{}]", mission.title, mission.status);
    println!("{}", RULE);
    println!();
    println!("ID:         {}", mission.id);
    println!("Session:    {}", mission.session_id);
    println!("Base:       {}", mission.base_branch);
    println!("Created:    {}", mission.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(started) = mission.started_at {
        println!("Started:    {}", started.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(completed) = mission.completed_at {
        println!("Finished:   {}", completed.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(failure) = &mission.failure {
        println!("Failure:    {}", failure);
    }
    println!();
    println!("Request:");
    for line in mission.description.lines() {
        println!("  {}", line);
    }
}

async fn print_task(orchestrator: &Orchestrator, task: &Task) -> Result<()> {
    println!();
    println!("Task {}: {} [{}]", task.position + 1, task.title, task.status);
    if !task.file_scope.is_empty() {
        println!("  Scope:    {}", task.file_scope.join(", "));
    }
    if let Some(agent_id) = task.agent_id
        && let Some(agent) = orchestrator.agent(agent_id).await?
    {
        println!("  Agent:    {} ({})", agent.name, agent.model);
    }
    if let Some(branch) = &task.branch {
        println!("  Branch:   {}", branch);
    }
    if task.retry_count > 0 {
        println!("  Retries:  {}", task.retry_count);
    }
    if let Some(commit) = &task.commit {
        println!("  Commit:   {}", commit);
    }
    if !task.files_changed.is_empty() {
        println!("  Files:    {}", task.files_changed.join(", "));
    }
    if let Some(summary) = &task.summary {
        println!("  Summary:  {}", summary);
    }
    if let Some(failure) = &task.failure {
        println!("  Failure:  {}", failure);
    }
    Ok(())
}

fn print_merges(mission: &Mission) {
    if mission.merge_results.is_empty() {
        return;
    }
    println!();
    println!("Merges:");
    for record in &mission.merge_results {
        match record.result.detail() {
            Some(detail) => println!(
                "  {:<8} {} ({})",
                record.result.label(),
                record.task_title,
                detail
            ),
            None => println!("  {:<8} {}", record.result.label(), record.task_title),
        }
    }
}
