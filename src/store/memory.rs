//! In-process store for tests and embedding.

use super::{Store, tail};
use crate::error::Result;
use crate::model::{Agent, AgentId, ConversationEntry, Mission, MissionId, Task, TaskId};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    missions: HashMap<MissionId, Mission>,
    tasks: HashMap<TaskId, Task>,
    agents: HashMap<AgentId, Agent>,
    conversations: HashMap<String, Vec<ConversationEntry>>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn save_mission(&self, mission: &Mission) -> Result<()> {
        self.state
            .write()
            .await
            .missions
            .insert(mission.id, mission.clone());
        Ok(())
    }

    async fn mission(&self, id: MissionId) -> Result<Option<Mission>> {
        Ok(self.state.read().await.missions.get(&id).cloned())
    }

    async fn missions(&self) -> Result<Vec<Mission>> {
        let mut missions: Vec<Mission> =
            self.state.read().await.missions.values().cloned().collect();
        missions.sort_by_key(|m| m.created_at);
        Ok(missions)
    }

    async fn save_task(&self, task: &Task) -> Result<()> {
        self.state.write().await.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn task(&self, id: TaskId) -> Result<Option<Task>> {
        Ok(self.state.read().await.tasks.get(&id).cloned())
    }

    async fn tasks_for_mission(&self, mission_id: MissionId) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .state
            .read()
            .await
            .tasks
            .values()
            .filter(|t| t.mission_id == mission_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.position);
        Ok(tasks)
    }

    async fn save_agent(&self, agent: &Agent) -> Result<()> {
        self.state
            .write()
            .await
            .agents
            .insert(agent.id, agent.clone());
        Ok(())
    }

    async fn agent(&self, id: AgentId) -> Result<Option<Agent>> {
        Ok(self.state.read().await.agents.get(&id).cloned())
    }

    async fn append_conversation(&self, entry: &ConversationEntry) -> Result<()> {
        self.state
            .write()
            .await
            .conversations
            .entry(entry.session_id.clone())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn recent_conversation(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationEntry>> {
        let entries = self
            .state
            .read()
            .await
            .conversations
            .get(session_id)
            .cloned()
            .unwrap_or_default();
        Ok(tail(entries, limit))
    }
}
