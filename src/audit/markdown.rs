//! Markdown audit trail on disk.
//!
//! ```text
//! {audit_dir}/mission-{mission_id}/overview.md
//! {audit_dir}/mission-{mission_id}/agent-{name}.md
//! {audit_dir}/mission-{mission_id}/summary.md
//! ```
//!
//! Files are only ever appended to.

use super::{AuditTrail, LogSection};
use crate::error::{AetherError, Result};
use crate::model::{Agent, MergeRecord, MergeResult, Mission, MissionId, Task};
use async_trait::async_trait;
use chrono::Utc;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

const DESCRIPTION_PREVIEW_CHARS: usize = 120;

pub struct MarkdownAuditTrail {
    root: PathBuf,
}

impl MarkdownAuditTrail {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn mission_dir(&self, mission_id: MissionId) -> PathBuf {
        self.root.join(format!("mission-{}", mission_id))
    }

    fn agent_file(&self, mission_id: MissionId, agent: &Agent) -> PathBuf {
        self.mission_dir(mission_id)
            .join(format!("agent-{}.md", agent.name))
    }
}

async fn append(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            AetherError::Audit(format!(
                "failed to create '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| AetherError::Audit(format!("failed to open '{}': {}", path.display(), e)))?;
    file.write_all(text.as_bytes())
        .await
        .map_err(|e| AetherError::Audit(format!("failed to write '{}': {}", path.display(), e)))?;
    file.flush()
        .await
        .map_err(|e| AetherError::Audit(format!("failed to flush '{}': {}", path.display(), e)))
}

/// `user@host` of the process writing the record.
fn actor() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    format!("{}@{}", user, host)
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn preview(text: &str) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match single_line.char_indices().nth(DESCRIPTION_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &single_line[..idx]),
        None => single_line,
    }
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}

fn scope_list(patterns: &[String]) -> String {
    if patterns.is_empty() {
        return "- _(any file in the repository)_\n".to_string();
    }
    patterns.iter().map(|p| format!("- `{}`\n", p)).collect()
}

#[async_trait]
impl AuditTrail for MarkdownAuditTrail {
    async fn write_mission_overview(
        &self,
        mission: &Mission,
        request: &str,
        plan: &[Task],
    ) -> Result<()> {
        let mut doc = String::new();
        let _ = writeln!(doc, "# Mission: {}\n", mission.title);
        let _ = writeln!(doc, "**Mission ID:** {}  ", mission.id);
        let _ = writeln!(doc, "**Created:** {}  ", timestamp());
        let _ = writeln!(doc, "**Actor:** {}  ", actor());
        let _ = writeln!(doc, "**Base branch:** `{}`\n", mission.base_branch);
        let _ = writeln!(doc, "## Original Request\n\n{}\n", request.trim());
        if let Some(summary) = &mission.plan_summary {
            let _ = writeln!(doc, "## Plan\n\n{}\n", summary.trim());
        }
        let _ = writeln!(doc, "## Tasks\n");
        for task in plan {
            let _ = writeln!(
                doc,
                "- [ ] **{}**: {}",
                task.title,
                preview(&task.description)
            );
            if !task.file_scope.is_empty() {
                let scope: Vec<String> = task.file_scope.iter().map(|p| format!("`{}`", p)).collect();
                let _ = writeln!(doc, "  - scope: {}", scope.join(", "));
            }
        }
        doc.push('\n');

        append(&self.mission_dir(mission.id).join("overview.md"), &doc).await
    }

    async fn write_agent_header(
        &self,
        mission: &Mission,
        task: &Task,
        agent: &Agent,
    ) -> Result<()> {
        let mut doc = String::new();
        let _ = writeln!(doc, "# Agent: {}\n", agent.name);
        let _ = writeln!(doc, "**Mission:** {}  ", mission.title);
        let _ = writeln!(doc, "**Task:** {}  ", task.title);
        let _ = writeln!(doc, "**Model:** {}  ", agent.model);
        let _ = writeln!(doc, "**Branch:** `{}`  ", agent.branch);
        let _ = writeln!(doc, "**Started:** {}\n", timestamp());
        let _ = writeln!(doc, "## Task Description\n\n{}\n", task.description.trim());
        let _ = writeln!(doc, "## Files in Scope\n\n{}", scope_list(&task.file_scope));
        let _ = writeln!(doc, "## Work Log\n");

        append(&self.agent_file(mission.id, agent), &doc).await
    }

    async fn append_agent_log(
        &self,
        mission_id: MissionId,
        agent: &Agent,
        section: &LogSection,
    ) -> Result<()> {
        let text = format!(
            "### {} ({})\n\n{}\n\n",
            section.heading,
            timestamp(),
            section.body.trim_end()
        );
        append(&self.agent_file(mission_id, agent), &text).await
    }

    async fn write_mission_summary(
        &self,
        mission: &Mission,
        tasks: &[Task],
        merge_results: &[MergeRecord],
        duration: Duration,
    ) -> Result<()> {
        let mut doc = String::new();
        let _ = writeln!(doc, "# Mission Summary: {}\n", mission.title);
        let _ = writeln!(doc, "**Status:** {}  ", mission.status);
        let _ = writeln!(doc, "**Duration:** {}  ", format_duration(duration));
        let _ = writeln!(doc, "**Finished:** {}\n", timestamp());
        let _ = writeln!(doc, "## Results\n");

        for record in merge_results {
            let mark = if record.result.is_merged() { "✓" } else { "✗" };
            let _ = write!(doc, "- {} **{}**: {}", mark, record.task_title, record.result.label());
            match &record.result {
                MergeResult::Merged { commit: Some(sha) } => {
                    let _ = write!(doc, " (`{}`)", &sha[..sha.len().min(12)]);
                }
                MergeResult::Merged { commit: None } => {}
                MergeResult::Conflict { detail } | MergeResult::Skipped { reason: detail } => {
                    let _ = write!(doc, " ({})", preview(detail));
                }
            }
            doc.push('\n');

            if let Some(task) = tasks.iter().find(|t| t.id == record.task_id)
                && !task.files_changed.is_empty()
            {
                let _ = writeln!(doc, "  - files: {}", task.files_changed.join(", "));
            }
        }
        if let Some(reason) = &mission.failure {
            let _ = writeln!(doc, "\n**Failure:** {}", reason);
        }
        doc.push('\n');

        append(&self.mission_dir(mission.id).join("summary.md"), &doc).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> (Mission, Task, Agent) {
        let mut mission = Mission::new("s", "Add greeting", "please add a greeting", "main");
        mission.plan_summary = Some("One task that writes hello.txt".to_string());
        let task = Task::new(
            mission.id,
            0,
            "Write hello",
            "Create hello.txt with a greeting",
            vec!["hello.txt".to_string()],
        );
        let agent = Agent::new(mission.id, task.id, "openai/gpt-4o-mini", "agent/x");
        (mission, task, agent)
    }

    #[tokio::test]
    async fn test_overview_layout() {
        let dir = TempDir::new().unwrap();
        let audit = MarkdownAuditTrail::new(dir.path());
        let (mission, task, _) = fixture();

        audit
            .write_mission_overview(&mission, "please add a greeting", &[task])
            .await
            .unwrap();

        let text =
            std::fs::read_to_string(audit.mission_dir(mission.id).join("overview.md")).unwrap();
        assert!(text.starts_with("# Mission: Add greeting"));
        assert!(text.contains("## Original Request\n\nplease add a greeting"));
        assert!(text.contains("## Plan\n\nOne task that writes hello.txt"));
        assert!(text.contains("- [ ] **Write hello**: Create hello.txt with a greeting"));
        assert!(text.contains("`hello.txt`"));
    }

    #[tokio::test]
    async fn test_agent_log_is_appended_in_order() {
        let dir = TempDir::new().unwrap();
        let audit = MarkdownAuditTrail::new(dir.path());
        let (mission, task, agent) = fixture();

        audit.write_agent_header(&mission, &task, &agent).await.unwrap();
        audit
            .append_agent_log(mission.id, &agent, &LogSection::new("Iteration 1", "wrote hello.txt"))
            .await
            .unwrap();
        audit
            .append_agent_log(mission.id, &agent, &LogSection::new("Result", "committed"))
            .await
            .unwrap();

        let path = audit
            .mission_dir(mission.id)
            .join(format!("agent-{}.md", agent.name));
        let text = std::fs::read_to_string(path).unwrap();
        let header = text.find("## Work Log").unwrap();
        let first = text.find("### Iteration 1").unwrap();
        let second = text.find("### Result").unwrap();
        assert!(header < first && first < second);
        assert!(text.contains("**Model:** openai/gpt-4o-mini"));
    }

    #[tokio::test]
    async fn test_summary_lists_each_result() {
        let dir = TempDir::new().unwrap();
        let audit = MarkdownAuditTrail::new(dir.path());
        let (mission, task, _) = fixture();
        let results = vec![
            MergeRecord {
                task_id: task.id,
                task_title: task.title.clone(),
                result: MergeResult::Merged {
                    commit: Some("0123456789abcdef".to_string()),
                },
            },
            MergeRecord {
                task_id: crate::model::TaskId::new(),
                task_title: "Broken".to_string(),
                result: MergeResult::Skipped {
                    reason: "task failed".to_string(),
                },
            },
        ];

        audit
            .write_mission_summary(&mission, &[task], &results, Duration::from_secs(125))
            .await
            .unwrap();

        let text =
            std::fs::read_to_string(audit.mission_dir(mission.id).join("summary.md")).unwrap();
        assert!(text.contains("**Duration:** 2m 5s"));
        assert!(text.contains("- ✓ **Write hello**: merged (`0123456789ab`)"));
        assert!(text.contains("- ✗ **Broken**: skipped (task failed)"));
    }

    #[test]
    fn test_preview_truncates_long_descriptions() {
        let long = "word ".repeat(100);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), DESCRIPTION_PREVIEW_CHARS + 3);
    }
}
