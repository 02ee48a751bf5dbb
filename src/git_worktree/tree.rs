//! Bounded file tree snapshots of a checkout.
//!
//! The planner sees the repository as an indented tree, capped by depth and
//! entry count. VCS metadata, dependency folders, build output, and aether's
//! own state directories are skipped.

use crate::error::{AetherError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory names never descended into or listed.
pub const SKIPPED_DIRS: &[&str] = &[
    ".git",
    ".aether",
    "node_modules",
    "target",
    "__pycache__",
    ".venv",
    "venv",
    "dist",
    ".next",
];

/// Depth and size caps for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeLimits {
    pub max_depth: usize,
    pub max_entries: usize,
}

/// One listed file or directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path relative to the snapshot root, `/`-separated.
    pub path: String,
    pub is_dir: bool,
}

/// A rendered, bounded listing of a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    pub root_name: String,
    pub entries: Vec<TreeEntry>,
    /// Whether the entry cap cut the listing short.
    pub truncated: bool,
    lines: Vec<String>,
}

impl FileTree {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Relative paths of listed files.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.path.as_str())
    }

    /// Render with box-drawing connectors.
    pub fn render(&self) -> String {
        let mut out = format!("{}/\n", self.root_name);
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        if self.truncated {
            out.push_str("... (listing truncated)\n");
        }
        out
    }
}

struct Walk<'a> {
    limits: TreeLimits,
    skip_paths: &'a [PathBuf],
    tree: FileTree,
}

/// Snapshot `root`, skipping [`SKIPPED_DIRS`] and anything under `skip_paths`.
///
/// This does blocking filesystem IO; async callers should run it on a
/// blocking thread.
pub fn snapshot_tree(root: &Path, limits: TreeLimits, skip_paths: &[PathBuf]) -> Result<FileTree> {
    if !root.is_dir() {
        return Err(AetherError::Git(format!(
            "cannot list files: '{}' is not a directory",
            root.display()
        )));
    }

    let root_name = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| ".".to_string());

    let mut walk = Walk {
        limits,
        skip_paths,
        tree: FileTree {
            root_name,
            ..FileTree::default()
        },
    };
    walk.visit(root, "", 0, "");
    Ok(walk.tree)
}

impl Walk<'_> {
    fn visit(&mut self, dir: &Path, rel: &str, depth: usize, prefix: &str) {
        if depth >= self.limits.max_depth {
            return;
        }
        let Ok(read) = fs::read_dir(dir) else {
            return;
        };

        let mut children: Vec<(String, bool)> = read
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                let is_dir = entry.file_type().ok()?.is_dir();
                if is_dir && SKIPPED_DIRS.contains(&name.as_str()) {
                    return None;
                }
                if self.skip_paths.iter().any(|p| entry.path().starts_with(p)) {
                    return None;
                }
                Some((name, is_dir))
            })
            .collect();
        // Directories first, then files, each alphabetical.
        children.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let count = children.len();
        for (i, (name, is_dir)) in children.into_iter().enumerate() {
            if self.tree.entries.len() >= self.limits.max_entries {
                self.tree.truncated = true;
                return;
            }
            let last = i + 1 == count;
            let connector = if last { "└── " } else { "├── " };
            let suffix = if is_dir { "/" } else { "" };
            self.tree
                .lines
                .push(format!("{}{}{}{}", prefix, connector, name, suffix));

            let path = if rel.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", rel, name)
            };
            self.tree.entries.push(TreeEntry {
                path: path.clone(),
                is_dir,
            });

            if is_dir {
                let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
                self.visit(&dir.join(&name), &path, depth + 1, &child_prefix);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/nested/deeper")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("README.md"), "# hi\n").unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}\n").unwrap();
        fs::write(root.join("src/nested/deeper/x.rs"), "\n").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "\n").unwrap();
        dir
    }

    fn limits(max_depth: usize, max_entries: usize) -> TreeLimits {
        TreeLimits {
            max_depth,
            max_entries,
        }
    }

    #[test]
    fn test_skips_vendor_and_vcs_dirs() {
        let dir = sample();
        let tree = snapshot_tree(dir.path(), limits(5, 100), &[]).unwrap();
        assert!(tree.entries.iter().all(|e| !e.path.starts_with("node_modules")));
        assert!(tree.entries.iter().all(|e| !e.path.starts_with(".git")));
        assert!(tree.files().any(|f| f == "src/nested/deeper/x.rs"));
    }

    #[test]
    fn test_depth_limit() {
        let dir = sample();
        let tree = snapshot_tree(dir.path(), limits(2, 100), &[]).unwrap();
        assert!(tree.entries.iter().any(|e| e.path == "src/nested"));
        assert!(!tree.entries.iter().any(|e| e.path == "src/nested/deeper"));
    }

    #[test]
    fn test_entry_limit_truncates() {
        let dir = sample();
        let tree = snapshot_tree(dir.path(), limits(5, 2), &[]).unwrap();
        assert_eq!(tree.entries.len(), 2);
        assert!(tree.truncated);
        assert!(tree.render().contains("truncated"));
    }

    #[test]
    fn test_render_uses_connectors() {
        let dir = sample();
        let tree = snapshot_tree(dir.path(), limits(2, 100), &[]).unwrap();
        let rendered = tree.render();
        assert!(rendered.contains("├── src/"));
        assert!(rendered.contains("└── README.md"));
        assert!(rendered.contains("│   ├── nested/"));
    }

    #[test]
    fn test_skip_paths_are_excluded() {
        let dir = sample();
        let skip = vec![dir.path().join("src/nested")];
        let tree = snapshot_tree(dir.path(), limits(5, 100), &skip).unwrap();
        assert!(!tree.entries.iter().any(|e| e.path.starts_with("src/nested")));
        assert!(tree.files().any(|f| f == "src/main.rs"));
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(snapshot_tree(&dir.path().join("nope"), limits(3, 10), &[]).is_err());
    }
}
