//! Configuration model for aether.
//!
//! This module defines the Config struct that represents `.aether/config.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! defaults for every field, environment overrides for secrets, and
//! validation of limits. A `Config` is read once and handed to the
//! orchestrator at construction.

mod model;
mod operations;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::{Config, LlmSettings};
pub use operations::{DEFAULT_CONFIG_PATH, ENV_REPO_PATH};
pub use types::{CredentialState, ModelProfile};
