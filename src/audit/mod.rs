//! Append-only audit trail of missions and agent work.
//!
//! The core writes through [`AuditTrail`] and never reads back. Writes are
//! fire-and-forget: [`record`] logs a failure and moves on.

mod markdown;

pub use markdown::MarkdownAuditTrail;

use crate::error::Result;
use crate::model::{Agent, MergeRecord, Mission, MissionId, Task};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// One work-log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSection {
    pub heading: String,
    pub body: String,
}

impl LogSection {
    pub fn new(heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait AuditTrail: Send + Sync {
    /// Record a new mission: the request and the planned tasks.
    async fn write_mission_overview(
        &self,
        mission: &Mission,
        request: &str,
        plan: &[Task],
    ) -> Result<()>;

    /// Start an agent's log.
    async fn write_agent_header(&self, mission: &Mission, task: &Task, agent: &Agent)
    -> Result<()>;

    /// Append one entry to an agent's log.
    async fn append_agent_log(
        &self,
        mission_id: MissionId,
        agent: &Agent,
        section: &LogSection,
    ) -> Result<()>;

    /// Record how a mission ended.
    async fn write_mission_summary(
        &self,
        mission: &Mission,
        tasks: &[Task],
        merge_results: &[MergeRecord],
        duration: Duration,
    ) -> Result<()>;
}

/// Await an audit write, logging instead of propagating failure.
pub async fn record<F>(what: &str, write: F)
where
    F: Future<Output = Result<()>>,
{
    if let Err(e) = write.await {
        warn!(record = what, error = %e, "audit trail write failed; continuing");
    }
}
