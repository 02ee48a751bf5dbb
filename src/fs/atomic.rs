//! Atomic file writes for persisted records.
//!
//! Content goes to a uniquely named temporary file in the target's directory,
//! is synced, then renamed over the target. Readers see either the old record
//! or the new one, never a partial write. Concurrent writers to the same
//! target do not share a temporary file; the last rename wins.

use crate::error::{AetherError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Atomically write bytes to a file, creating parent directories.
///
/// # Returns
///
/// * `Ok(())` - On successful atomic write
/// * `Err(AetherError::Store)` - On write, sync, or rename failure
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| {
            AetherError::Store(format!(
                "failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path)?;
    let written = write_and_sync(&temp_path, content).and_then(|()| {
        fs::rename(&temp_path, path).map_err(|e| {
            AetherError::Store(format!(
                "failed to atomically replace '{}': {}",
                path.display(),
                e
            ))
        })
    });

    if written.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    written
}

/// `.{filename}.{pid}.{n}.tmp` next to the target.
fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            AetherError::Store(format!("invalid file path '{}'", target.display()))
        })?;
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp_name = format!(".{}.{}.{}.tmp", filename, std::process::id(), n);
    Ok(target.with_file_name(temp_name))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        AetherError::Store(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;
    file.write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| AetherError::Store(format!("failed to write temporary file: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("missions").join("m.json");

        atomic_write(&file_path, b"{}").unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "{}");
    }

    #[test]
    fn test_atomic_write_replaces_and_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("task.json");
        fs::write(&file_path, "old").unwrap();

        atomic_write(&file_path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new");
        let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_temp_paths_are_unique() {
        let target = Path::new("/state/a.json");
        let a = temp_path_for(target).unwrap();
        let b = temp_path_for(target).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.parent(), target.parent());
    }
}
