//! Reading and editing files inside a task workspace.
//!
//! Callers pass workspace-relative paths that have already been checked
//! against the task scope (see `agent::scope`).

use crate::error::{AetherError, Result};
use std::io::ErrorKind;
use std::path::Path;

/// A file shown to an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedFile {
    pub path: String,
    pub contents: FileContents,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContents {
    Text { text: String, truncated: bool },
    Binary,
    NotFound,
}

/// Read each path under `root`, capping every file at `max_bytes`.
pub async fn read_scoped_files(
    root: &Path,
    paths: &[String],
    max_bytes: usize,
) -> Vec<ScopedFile> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let contents = match tokio::fs::read(root.join(path)).await {
            Ok(bytes) => decode(bytes, max_bytes),
            Err(_) => FileContents::NotFound,
        };
        files.push(ScopedFile {
            path: path.clone(),
            contents,
        });
    }
    files
}

fn decode(mut bytes: Vec<u8>, max_bytes: usize) -> FileContents {
    if bytes.contains(&0) {
        return FileContents::Binary;
    }
    let truncated = bytes.len() > max_bytes;
    bytes.truncate(max_bytes);
    FileContents::Text {
        // A cut inside a multi-byte character decodes as U+FFFD.
        text: String::from_utf8_lossy(&bytes).into_owned(),
        truncated,
    }
}

/// Write `content` to `root/rel`, creating parent directories.
pub async fn write_file(root: &Path, rel: &str, content: &str) -> Result<()> {
    let target = root.join(rel);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            AetherError::Execution(format!("failed to create directory for '{}': {}", rel, e))
        })?;
    }
    tokio::fs::write(&target, content)
        .await
        .map_err(|e| AetherError::Execution(format!("failed to write '{}': {}", rel, e)))
}

/// Delete `root/rel`. Returns `false` when the file did not exist.
pub async fn delete_file(root: &Path, rel: &str) -> Result<bool> {
    match tokio::fs::remove_file(root.join(rel)).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AetherError::Execution(format!(
            "failed to delete '{}': {}",
            rel, e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read_and_delete() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "src/deep/new.rs", "fn x() {}\n")
            .await
            .unwrap();

        let files = read_scoped_files(
            dir.path(),
            &["src/deep/new.rs".to_string(), "missing.rs".to_string()],
            1024,
        )
        .await;
        assert_eq!(
            files[0].contents,
            FileContents::Text {
                text: "fn x() {}\n".to_string(),
                truncated: false
            }
        );
        assert_eq!(files[1].contents, FileContents::NotFound);

        assert!(delete_file(dir.path(), "src/deep/new.rs").await.unwrap());
        assert!(!delete_file(dir.path(), "src/deep/new.rs").await.unwrap());
    }

    #[tokio::test]
    async fn test_large_and_binary_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("big.txt"), "x".repeat(100)).unwrap();
        std::fs::write(dir.path().join("blob.bin"), [0u8, 1, 2]).unwrap();

        let files = read_scoped_files(
            dir.path(),
            &["big.txt".to_string(), "blob.bin".to_string()],
            10,
        )
        .await;
        assert_eq!(
            files[0].contents,
            FileContents::Text {
                text: "x".repeat(10),
                truncated: true
            }
        );
        assert_eq!(files[1].contents, FileContents::Binary);
    }
}
