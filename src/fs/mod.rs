//! Filesystem utilities for aether.
//!
//! Atomic writes for persisted state, and file access inside task workspaces.

pub mod atomic;
pub mod workspace;

pub use atomic::atomic_write;
pub use workspace::{FileContents, ScopedFile, delete_file, read_scoped_files, write_file};
