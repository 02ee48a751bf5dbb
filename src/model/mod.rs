//! Domain records: missions, tasks, agents, conversation entries, merge results.
//!
//! Each record carries its own status machine; owners mutate records only
//! through the transition methods so invalid moves surface as
//! `AetherError::State`.

mod agent;
mod conversation;
mod ids;
mod merge;
mod mission;
mod task;

pub use agent::Agent;
pub use conversation::{ConversationEntry, Role};
pub use ids::{AgentId, MissionId, TaskId};
pub use merge::{MergeRecord, MergeResult};
pub use mission::{Mission, MissionStatus};
pub use task::{Task, TaskStatus};
