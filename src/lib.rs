//! Aether: mission orchestration for agentic coding.
//!
//! A user message either gets a conversational reply or becomes a
//! [`Mission`](model::Mission): a plan of tasks, each run by one LLM agent on
//! its own git branch and worktree, merged back into the base branch in
//! planned order. See [`orchestrator::Orchestrator`] for the entry point.

pub mod agent;
pub mod audit;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod git;
pub mod git_worktree;
pub mod llm;
pub mod merge;
pub mod model;
pub mod orchestrator;
pub mod planner;
pub mod store;
pub mod vcs;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{AetherError, Result};
pub use orchestrator::Orchestrator;
