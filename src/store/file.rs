//! File-backed store.
//!
//! Layout under the state directory:
//!
//! ```text
//! missions/{mission_id}.json
//! tasks/{task_id}.json
//! agents/{agent_id}.json
//! conversations/{session}.ndjson
//! ```
//!
//! Records are written atomically (temp file + rename). Conversations are
//! NDJSON, one entry per line, appended and synced.

use super::{Store, tail};
use crate::error::{AetherError, Result};
use crate::fs::atomic_write;
use crate::model::{Agent, AgentId, ConversationEntry, Mission, MissionId, Task, TaskId};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create) a store rooted at `root`.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for dir in ["missions", "tasks", "agents", "conversations"] {
            fs::create_dir_all(root.join(dir)).map_err(|e| {
                AetherError::Store(format!(
                    "failed to create state directory '{}': {}",
                    root.join(dir).display(),
                    e
                ))
            })?;
        }
        Ok(Self { root })
    }

    fn record_path(&self, kind: &str, id: impl std::fmt::Display) -> PathBuf {
        self.root.join(kind).join(format!("{}.json", id))
    }

    fn conversation_path(&self, session_id: &str) -> PathBuf {
        self.root
            .join("conversations")
            .join(format!("{}.ndjson", session_file_stem(session_id)))
    }
}

/// Session ids are caller-chosen; keep them to a safe file stem.
fn session_file_stem(session_id: &str) -> String {
    let stem: String = session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "_".to_string()
    } else {
        stem
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AetherError::Store(format!("store worker failed: {}", e)))?
}

fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(record)
        .map_err(|e| AetherError::Store(format!("failed to serialize record: {}", e)))?;
    atomic_write(path, &json)
}

fn read_record<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AetherError::Store(format!(
                "failed to read '{}': {}",
                path.display(),
                e
            )));
        }
    };
    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        AetherError::Store(format!("corrupt record '{}': {}", path.display(), e))
    })
}

fn read_all<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        AetherError::Store(format!("failed to list '{}': {}", dir.display(), e))
    })?;

    let mut records = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(record) = read_record(&path)? {
            records.push(record);
        }
    }
    Ok(records)
}

#[async_trait]
impl Store for FileStore {
    async fn save_mission(&self, mission: &Mission) -> Result<()> {
        let path = self.record_path("missions", mission.id);
        let mission = mission.clone();
        blocking(move || write_record(&path, &mission)).await
    }

    async fn mission(&self, id: MissionId) -> Result<Option<Mission>> {
        let path = self.record_path("missions", id);
        blocking(move || read_record(&path)).await
    }

    async fn missions(&self) -> Result<Vec<Mission>> {
        let dir = self.root.join("missions");
        let mut missions: Vec<Mission> = blocking(move || read_all(&dir)).await?;
        missions.sort_by_key(|m| m.created_at);
        Ok(missions)
    }

    async fn save_task(&self, task: &Task) -> Result<()> {
        let path = self.record_path("tasks", task.id);
        let task = task.clone();
        blocking(move || write_record(&path, &task)).await
    }

    async fn task(&self, id: TaskId) -> Result<Option<Task>> {
        let path = self.record_path("tasks", id);
        blocking(move || read_record(&path)).await
    }

    async fn tasks_for_mission(&self, mission_id: MissionId) -> Result<Vec<Task>> {
        let dir = self.root.join("tasks");
        let mut tasks: Vec<Task> = blocking(move || read_all(&dir)).await?;
        tasks.retain(|t| t.mission_id == mission_id);
        tasks.sort_by_key(|t| t.position);
        Ok(tasks)
    }

    async fn save_agent(&self, agent: &Agent) -> Result<()> {
        let path = self.record_path("agents", agent.id);
        let agent = agent.clone();
        blocking(move || write_record(&path, &agent)).await
    }

    async fn agent(&self, id: AgentId) -> Result<Option<Agent>> {
        let path = self.record_path("agents", id);
        blocking(move || read_record(&path)).await
    }

    async fn append_conversation(&self, entry: &ConversationEntry) -> Result<()> {
        let path = self.conversation_path(&entry.session_id);
        let mut line = serde_json::to_string(entry).map_err(|e| {
            AetherError::Store(format!("failed to serialize conversation entry: {}", e))
        })?;
        line.push('\n');

        blocking(move || {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| {
                    AetherError::Store(format!("failed to open '{}': {}", path.display(), e))
                })?;
            file.write_all(line.as_bytes())
                .and_then(|()| file.sync_all())
                .map_err(|e| {
                    AetherError::Store(format!("failed to append to '{}': {}", path.display(), e))
                })
        })
        .await
    }

    async fn recent_conversation(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationEntry>> {
        let path = self.conversation_path(session_id);
        let session_id = session_id.to_string();

        let entries = blocking(move || {
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => {
                    return Err(AetherError::Store(format!(
                        "failed to read '{}': {}",
                        path.display(),
                        e
                    )));
                }
            };

            // A torn final line from a crash mid-append is skipped.
            Ok(content
                .lines()
                .filter_map(|line| serde_json::from_str::<ConversationEntry>(line).ok())
                .filter(|entry| entry.session_id == session_id)
                .collect::<Vec<_>>())
        })
        .await?;

        Ok(tail(entries, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_session_file_stem_is_path_safe() {
        assert_eq!(session_file_stem("web-42_a"), "web-42_a");
        assert_eq!(session_file_stem("../../etc/passwd"), "______etc_passwd");
        assert_eq!(session_file_stem(""), "_");
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let mission = Mission::new("s", "t", "d", "main");
        FileStore::open(dir.path())
            .unwrap()
            .save_mission(&mission)
            .await
            .unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.mission(mission.id).await.unwrap(), Some(mission));
    }

    #[tokio::test]
    async fn test_corrupt_record_is_store_error() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let id = MissionId::new();
        fs::write(store.record_path("missions", id), "{ not json").unwrap();

        let err = store.mission(id).await.unwrap_err();
        assert!(matches!(err, AetherError::Store(_)));
    }
}
