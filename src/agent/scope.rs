//! Task file scope enforcement.
//!
//! A task's scope is a list of repository-relative paths and glob patterns.
//! A path is in scope when it:
//! - equals a literal scope entry, or
//! - lies under a literal entry treated as a directory, or
//! - matches a glob entry.
//!
//! An empty scope allows any repository-relative path. Absolute paths,
//! paths that climb out of the workspace (`..`), anything inside a `.git`
//! entry, and reserved directories are always rejected.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fmt;
use std::path::{Component, Path};

/// Why a path was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeViolationType {
    /// Absolute, empty, escaping the workspace, or reserved.
    InvalidPath,
    /// Well-formed but outside the task's scope.
    OutOfScope,
}

/// A single refused path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeViolation {
    pub file_path: String,
    pub violation_type: ScopeViolationType,
}

impl ScopeViolation {
    fn invalid(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            violation_type: ScopeViolationType::InvalidPath,
        }
    }

    fn out_of_scope(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            violation_type: ScopeViolationType::OutOfScope,
        }
    }
}

impl fmt::Display for ScopeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.violation_type {
            ScopeViolationType::InvalidPath => write!(
                f,
                "'{}' is not an editable relative path inside the repository",
                self.file_path
            ),
            ScopeViolationType::OutOfScope => {
                write!(f, "'{}' is outside the task's file scope", self.file_path)
            }
        }
    }
}

/// Compiled scope of one task.
#[derive(Debug, Clone)]
pub struct ScopeGuard {
    patterns: Vec<String>,
    literals: Vec<String>,
    globs: GlobSet,
    reserved: Vec<String>,
}

impl ScopeGuard {
    /// Compile scope patterns. Returns a message naming the first bad pattern.
    pub fn new(patterns: &[String]) -> Result<Self, String> {
        let mut literals = Vec::new();
        let mut builder = GlobSetBuilder::new();

        for raw in patterns {
            let pattern = normalize_path(raw.trim());
            if pattern.is_empty() {
                continue;
            }
            if !is_relative_inside(&pattern) {
                return Err(format!(
                    "scope entry '{}' must be a relative path inside the repository",
                    raw
                ));
            }
            if is_glob(&pattern) {
                let glob = Glob::new(&pattern)
                    .map_err(|e| format!("invalid glob pattern '{}': {}", raw, e))?;
                builder.add(glob);
            } else {
                literals.push(pattern.trim_end_matches('/').to_string());
            }
        }

        let globs = builder
            .build()
            .map_err(|e| format!("failed to compile scope globs: {}", e))?;

        Ok(Self {
            patterns: patterns.to_vec(),
            literals,
            globs,
            reserved: Vec::new(),
        })
    }

    /// Directories no edit may touch, whatever the scope says.
    ///
    /// Entries are repository-relative; absolute or escaping entries are
    /// ignored since no accepted path can reach them.
    pub fn with_reserved<S: AsRef<str>>(mut self, dirs: &[S]) -> Self {
        self.reserved.extend(
            dirs.iter()
                .map(|d| normalize_path(d.as_ref().trim()))
                .map(|d| d.trim_start_matches("./").trim_end_matches('/').to_string())
                .filter(|d| !d.is_empty() && is_relative_inside(d)),
        );
        self
    }

    /// Whether any repository path is allowed.
    pub fn is_unrestricted(&self) -> bool {
        self.literals.is_empty() && self.globs.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check a path proposed by a model and return its normalized form.
    pub fn check(&self, path: &str) -> Result<String, ScopeViolation> {
        let normalized = normalize_path(path.trim());
        let normalized = normalized.trim_start_matches("./").to_string();
        if normalized.is_empty()
            || normalized.ends_with('/')
            || !is_relative_inside(&normalized)
            || touches_git_dir(&normalized)
            || self.is_reserved(&normalized)
        {
            return Err(ScopeViolation::invalid(path));
        }
        if self.allows(&normalized) {
            Ok(normalized)
        } else {
            Err(ScopeViolation::out_of_scope(normalized))
        }
    }

    fn is_reserved(&self, path: &str) -> bool {
        self.reserved.iter().any(|dir| is_within(path, dir))
    }

    fn allows(&self, path: &str) -> bool {
        if self.is_unrestricted() {
            return true;
        }
        self.globs.is_match(path)
            || self.literals.iter().any(|literal| {
                path == literal
                    || path
                        .strip_prefix(literal.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
    }

    /// Files from `candidates` the agent should see, plus literal entries
    /// that do not exist yet.
    pub fn visible_files<'a>(&self, candidates: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut files: Vec<String> = candidates
            .into_iter()
            .filter(|f| !self.is_unrestricted() && self.allows(f))
            .map(str::to_string)
            .collect();
        for literal in &self.literals {
            if !files.iter().any(|f| f == literal || f.starts_with(&format!("{}/", literal))) {
                files.push(literal.clone());
            }
        }
        files.sort();
        files.dedup();
        files
    }
}

/// `path` equals `dir` or lies below it.
fn is_within(path: &str, dir: &str) -> bool {
    path == dir
        || path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Any `.git` component: the gitlink of a worktree or a nested repository.
fn touches_git_dir(path: &str) -> bool {
    Path::new(path)
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name.eq_ignore_ascii_case(".git")))
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

fn is_relative_inside(path: &str) -> bool {
    let path = Path::new(path);
    !path.has_root()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Forward slashes only, so matching is platform independent.
fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(patterns: &[&str]) -> ScopeGuard {
        ScopeGuard::new(&patterns.iter().map(|p| p.to_string()).collect::<Vec<_>>()).unwrap()
    }

    #[test]
    fn test_exact_path_allowed() {
        let g = guard(&["src/foo.rs"]);
        assert_eq!(g.check("src/foo.rs"), Ok("src/foo.rs".to_string()));
        assert_eq!(g.check("./src/foo.rs"), Ok("src/foo.rs".to_string()));
    }

    #[test]
    fn test_literal_acts_as_directory() {
        let g = guard(&["src/player"]);
        assert!(g.check("src/player/jump.rs").is_ok());
        assert!(g.check("src/playerx.rs").is_err());
    }

    #[test]
    fn test_glob_pattern() {
        let g = guard(&["src/**/*.rs"]);
        assert!(g.check("src/a/b/c.rs").is_ok());
        let err = g.check("docs/readme.md").unwrap_err();
        assert_eq!(err.violation_type, ScopeViolationType::OutOfScope);
    }

    #[test]
    fn test_empty_scope_allows_relative_paths_only() {
        let g = guard(&[]);
        assert!(g.is_unrestricted());
        assert!(g.check("anything/at/all.txt").is_ok());
        for bad in ["/etc/passwd", "../outside.txt", "a/../../b", "", "dir/"] {
            let err = g.check(bad).unwrap_err();
            assert_eq!(err.violation_type, ScopeViolationType::InvalidPath, "{}", bad);
        }
    }

    #[test]
    fn test_git_entries_rejected_even_when_unrestricted() {
        let g = guard(&[]);
        for bad in [".git", "./.git", ".git/config", ".git/", "vendor/lib/.git", ".GIT/HEAD"] {
            let err = g.check(bad).unwrap_err();
            assert_eq!(err.violation_type, ScopeViolationType::InvalidPath, "{}", bad);
        }
        assert!(g.check(".gitignore").is_ok());
        assert!(g.check("docs/.github/ci.yml").is_ok());
    }

    #[test]
    fn test_git_entries_rejected_inside_matching_glob() {
        let g = guard(&["**"]);
        assert!(g.check(".git/HEAD").is_err());
        assert!(g.check("src/lib.rs").is_ok());
    }

    #[test]
    fn test_reserved_directories_rejected() {
        let g = guard(&[]).with_reserved(&[".aether/worktrees", "./.aether/state/", "/abs"]);
        for bad in [".aether/worktrees", ".aether/worktrees/other/x.rs", ".aether/state/missions.json"] {
            let err = g.check(bad).unwrap_err();
            assert_eq!(err.violation_type, ScopeViolationType::InvalidPath, "{}", bad);
        }
        assert!(g.check(".aether/notes.md").is_ok());
        assert!(g.check(".aether/statement.md").is_ok());
    }

    #[test]
    fn test_escaping_patterns_rejected() {
        assert!(ScopeGuard::new(&["../x".to_string()]).is_err());
        assert!(ScopeGuard::new(&["/abs/**".to_string()]).is_err());
        assert!(ScopeGuard::new(&["src/[".to_string()]).is_err());
    }

    #[test]
    fn test_visible_files_includes_missing_literals() {
        let g = guard(&["src/*.rs", "NEW.md"]);
        let files = g.visible_files(["src/a.rs", "src/b.txt", "README.md"]);
        assert_eq!(files, vec!["NEW.md".to_string(), "src/a.rs".to_string()]);
    }

    #[test]
    fn test_violation_message_names_path() {
        let g = guard(&["a.txt"]);
        let msg = g.check("b.txt").unwrap_err().to_string();
        assert!(msg.contains("'b.txt'"));
    }
}
