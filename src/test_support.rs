use crate::audit::{AuditTrail, LogSection};
use crate::config::Config;
use crate::error::{AetherError, Result};
use crate::llm::{ChatMessage, LlmError, TextGeneration};
use crate::model::{Agent, MergeRecord, Mission, MissionId, Task};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Command;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

pub(crate) fn create_test_repo() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path();

    git(path, &["init"]);
    // Deterministic default branch name across environments.
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"]);

    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test User"]);

    std::fs::write(path.join("README.md"), "# Test\n").unwrap();
    git(path, &["add", "."]);
    git(path, &["commit", "-m", "Initial commit"]);

    temp_dir
}

/// Commit `file` with `content` on a new branch cut from `main`, then return to `main`.
pub(crate) fn commit_file_on_branch(repo_dir: &Path, branch: &str, file: &str, content: &str) {
    git(repo_dir, &["checkout", "-b", branch, "main"]);
    std::fs::write(repo_dir.join(file), content).unwrap();
    git(repo_dir, &["add", "."]);
    git(repo_dir, &["commit", "-m", &format!("change {}", file)]);
    git(repo_dir, &["checkout", "main"]);
}

pub(crate) fn git(repo_dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(repo_dir)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute git {}: {}", args.join(" "), e));

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "git {} failed (exit code {:?})\nstdout:\n{}\nstderr:\n{}",
            args.join(" "),
            output.status.code(),
            stdout,
            stderr
        );
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Config with a usable key and short timeouts.
pub(crate) fn test_config(repo: Option<&Path>) -> Config {
    let mut config = Config::default();
    config.repo_path = repo.map(Path::to_path_buf);
    config.llm.api_key = Some("test-key".to_string());
    config.llm.timeout_secs = 5;
    config
}

type Reply = std::result::Result<String, LlmError>;

/// A [`TextGeneration`] that replays scripted responses.
///
/// Resolution order per call: the first rule whose needle occurs in the last
/// message, then the queue, then the fallback.
pub(crate) struct ScriptedLlm {
    model: String,
    rules: Vec<(String, Reply)>,
    queue: Mutex<VecDeque<Reply>>,
    fallback: Option<Reply>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub(crate) fn new(replies: Vec<Reply>) -> Self {
        Self {
            model: "scripted-model".to_string(),
            rules: Vec::new(),
            queue: Mutex::new(replies.into()),
            fallback: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replies(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub(crate) fn failing(error: LlmError) -> Self {
        Self::new(Vec::new()).with_fallback(Err(error))
    }

    pub(crate) fn with_fallback(mut self, reply: Reply) -> Self {
        self.fallback = Some(reply);
        self
    }

    /// Answer every request whose last message contains `needle`.
    pub(crate) fn on(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), Ok(reply.to_string())));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGeneration for ScriptedLlm {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> std::result::Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(messages.to_vec());

        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        if let Some((_, reply)) = self.rules.iter().find(|(needle, _)| last.contains(needle)) {
            return reply.clone();
        }
        if let Some(reply) = self.queue.lock().unwrap().pop_front() {
            return reply;
        }
        self.fallback
            .clone()
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("script exhausted".to_string())))
    }
}

/// An [`AuditTrail`] that remembers what it was asked to write.
#[derive(Default)]
pub(crate) struct RecordingAudit {
    events: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingAudit {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every write fails after being recorded.
    pub(crate) fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) -> Result<()> {
        self.events.lock().unwrap().push(event);
        if self.fail {
            Err(AetherError::Audit("disk full".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AuditTrail for RecordingAudit {
    async fn write_mission_overview(
        &self,
        mission: &Mission,
        _request: &str,
        plan: &[Task],
    ) -> Result<()> {
        self.push(format!("overview {} tasks={}", mission.id, plan.len()))
    }

    async fn write_agent_header(&self, _mission: &Mission, task: &Task, agent: &Agent) -> Result<()> {
        self.push(format!("header {} {}", agent.name, task.title))
    }

    async fn append_agent_log(
        &self,
        _mission_id: MissionId,
        agent: &Agent,
        section: &LogSection,
    ) -> Result<()> {
        self.push(format!("log {} {}", agent.name, section.heading))
    }

    async fn write_mission_summary(
        &self,
        mission: &Mission,
        _tasks: &[Task],
        merge_results: &[MergeRecord],
        _duration: Duration,
    ) -> Result<()> {
        self.push(format!(
            "summary {} {} results={}",
            mission.id,
            mission.status,
            merge_results.len()
        ))
    }
}
