//! The mission orchestrator: the top-level entry point for user messages.
//!
//! A message is answered in one of two modes:
//!
//! - **Conversational**: one completion over the session's recent history.
//!   Always used when no repository is configured.
//! - **Orchestration**: snapshot, plan, run one agent per task, merge in
//!   planned order, finalize the mission.
//!
//! Messages of one session are handled strictly in arrival order; sessions
//! are independent of each other.

mod classify;
mod conversation;
mod mission;
pub mod narration;

pub use classify::{HeuristicClassifier, MessageClassifier, MessageKind};
pub use narration::CONFIGURATION_REPLY;

use crate::audit::AuditTrail;
use crate::config::{Config, CredentialState};
use crate::error::Result;
use crate::llm::TextGeneration;
use crate::model::{Agent, AgentId, Mission, MissionId, Task};
use crate::store::Store;
use crate::vcs::VersionControl;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, instrument, warn};

pub struct Orchestrator {
    config: Config,
    credentials: CredentialState,
    llm: Arc<dyn TextGeneration>,
    agent_llm: Arc<dyn TextGeneration>,
    store: Arc<dyn Store>,
    audit: Arc<dyn AuditTrail>,
    vcs: Option<Arc<dyn VersionControl>>,
    classifier: Box<dyn MessageClassifier>,
    retry_backoff: Duration,
    sessions: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Orchestrator {
    /// Build a conversational-only orchestrator. `config` is read here once.
    pub fn new(
        config: Config,
        llm: Arc<dyn TextGeneration>,
        store: Arc<dyn Store>,
        audit: Arc<dyn AuditTrail>,
    ) -> Self {
        Self {
            credentials: config.llm.credential_state(),
            config,
            agent_llm: llm.clone(),
            llm,
            store,
            audit,
            vcs: None,
            classifier: Box::new(HeuristicClassifier),
            retry_backoff: Duration::from_secs(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Enable orchestration mode against `vcs`.
    pub fn with_repository(mut self, vcs: Arc<dyn VersionControl>) -> Self {
        self.vcs = Some(vcs);
        self
    }

    /// Use a separate client (model profile) for sub-agents.
    pub fn with_agent_llm(mut self, llm: Arc<dyn TextGeneration>) -> Self {
        self.agent_llm = llm;
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn MessageClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Base delay between planner transport retries.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn has_repository(&self) -> bool {
        self.vcs.is_some()
    }

    /// Answer one user message. Always returns natural language.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn handle_user_message(&self, session_id: &str, text: &str) -> String {
        if !self.credentials.is_usable() {
            warn!(credentials = ?self.credentials, "no usable API key; refusing to call the model");
            return CONFIGURATION_REPLY.to_string();
        }

        let lock = self.session_lock(session_id);
        let reply = {
            let _guard = lock.lock().await;
            self.respond(session_id, text).await
        };
        self.release_session(session_id, lock);
        reply
    }

    async fn respond(&self, session_id: &str, text: &str) -> String {
        let Some(vcs) = self.vcs.clone() else {
            return self.converse(session_id, text, None).await;
        };
        match self.classifier.classify(text) {
            MessageKind::Conversational => self.converse(session_id, text, None).await,
            MessageKind::Task => {
                info!("message classified as a task request");
                self.orchestrate(session_id, text, vcs).await
            }
        }
    }

    pub async fn mission(&self, id: MissionId) -> Result<Option<Mission>> {
        self.store.mission(id).await
    }

    pub async fn missions(&self) -> Result<Vec<Mission>> {
        self.store.missions().await
    }

    pub async fn tasks(&self, mission_id: MissionId) -> Result<Vec<Task>> {
        self.store.tasks_for_mission(mission_id).await
    }

    pub async fn agent(&self, id: AgentId) -> Result<Option<Agent>> {
        self.store.agent(id).await
    }

    fn session_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        sessions.entry(session_id.to_string()).or_default().clone()
    }

    /// Drop the session's lock entry once no other message holds or awaits it.
    fn release_session(&self, session_id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        drop(lock);
        if sessions
            .get(session_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            sessions.remove(session_id);
        }
    }
}
