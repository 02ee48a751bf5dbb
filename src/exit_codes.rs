//! Exit code constants for the aether CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, unknown mission)
//! - 2: Configuration error (missing credentials, invalid config)
//! - 3: Git operation failure
//! - 4: Persistence or audit trail failure
//! - 5: Mission failure (planning or execution)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or a reference to something that does not exist.
pub const USER_ERROR: i32 = 1;

/// Configuration error: invalid config file, missing or rejected credentials.
pub const CONFIGURATION_ERROR: i32 = 2;

/// Git operation failure: branch, worktree, commit, or merge errors.
pub const GIT_FAILURE: i32 = 3;

/// State store or audit trail could not be read or written.
pub const STORAGE_FAILURE: i32 = 4;

/// A mission could not be planned or its tasks could not be executed.
pub const MISSION_FAILURE: i32 = 5;
