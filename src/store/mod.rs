//! Persistence for missions, tasks, agents, and conversations.
//!
//! The core talks to [`Store`] only. Each record is written whole, so updates
//! to different tasks never contend. Conversations are append-only.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::model::{Agent, AgentId, ConversationEntry, Mission, MissionId, Task, TaskId};
use async_trait::async_trait;

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or replace a mission.
    async fn save_mission(&self, mission: &Mission) -> Result<()>;

    async fn mission(&self, id: MissionId) -> Result<Option<Mission>>;

    /// All missions, oldest first.
    async fn missions(&self) -> Result<Vec<Mission>>;

    /// Insert or replace a task.
    async fn save_task(&self, task: &Task) -> Result<()>;

    async fn task(&self, id: TaskId) -> Result<Option<Task>>;

    /// A mission's tasks in planned order.
    async fn tasks_for_mission(&self, mission_id: MissionId) -> Result<Vec<Task>>;

    /// Insert or replace an agent.
    async fn save_agent(&self, agent: &Agent) -> Result<()>;

    async fn agent(&self, id: AgentId) -> Result<Option<Agent>>;

    /// Append one entry to its session's conversation.
    async fn append_conversation(&self, entry: &ConversationEntry) -> Result<()>;

    /// The last `limit` entries of a session, oldest first.
    async fn recent_conversation(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationEntry>>;
}

/// Keep the last `limit` items.
fn tail<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    if items.len() > limit {
        items.drain(..items.len() - limit);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use tempfile::TempDir;

    async fn exercise(store: &dyn Store) {
        let mission = Mission::new("s1", "Greeting", "add greeting", "main");
        store.save_mission(&mission).await.unwrap();

        let second = Task::new(mission.id, 1, "second", "", Vec::new());
        let first = Task::new(mission.id, 0, "first", "", Vec::new());
        store.save_task(&second).await.unwrap();
        store.save_task(&first).await.unwrap();

        let other_mission = Mission::new("s2", "Other", "other", "main");
        store
            .save_task(&Task::new(other_mission.id, 0, "other", "", Vec::new()))
            .await
            .unwrap();

        let tasks = store.tasks_for_mission(mission.id).await.unwrap();
        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);

        let mut updated = first.clone();
        updated.start().unwrap();
        store.save_task(&updated).await.unwrap();
        assert_eq!(
            store.task(first.id).await.unwrap().unwrap().status,
            crate::model::TaskStatus::Running
        );

        let agent = Agent::new(mission.id, first.id, "model", "agent/b");
        store.save_agent(&agent).await.unwrap();
        assert_eq!(store.agent(agent.id).await.unwrap(), Some(agent));

        assert_eq!(store.mission(mission.id).await.unwrap(), Some(mission));
        assert_eq!(store.missions().await.unwrap().len(), 1);
        assert_eq!(store.mission(MissionId::new()).await.unwrap(), None);

        for i in 0..5 {
            store
                .append_conversation(&ConversationEntry::user("s1", format!("m{}", i)))
                .await
                .unwrap();
        }
        store
            .append_conversation(&ConversationEntry::assistant("s2", "elsewhere"))
            .await
            .unwrap();

        let recent = store.recent_conversation("s1", 3).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
        assert!(recent.iter().all(|e| e.role == Role::User));
        assert!(store.recent_conversation("nobody", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_contract() {
        exercise(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_file_store_contract() {
        let dir = TempDir::new().unwrap();
        exercise(&FileStore::open(dir.path()).unwrap()).await;
    }

    #[test]
    fn test_tail() {
        assert_eq!(tail(vec![1, 2, 3, 4], 2), vec![3, 4]);
        assert_eq!(tail(vec![1], 5), vec![1]);
        assert!(tail(vec![1, 2], 0).is_empty());
    }
}
