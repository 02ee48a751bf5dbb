//! Planner prompt.

use crate::git_worktree::FileTree;
use crate::llm::ChatMessage;

const SYSTEM_PROMPT: &str = r#"You are the planning agent of a coding team. Decompose the user's request about a repository into independent tasks, each executed by a separate coding agent on its own git branch.

Rules:
- Give each task a clear file scope that does not overlap with other tasks when possible.
- Scope entries are repository-relative paths or glob patterns (for example "src/api/*.rs").
- Keep tasks granular, one concern per task. A simple request needs exactly one task.
- Order tasks so that earlier tasks do not depend on later ones.
- Each description must be detailed enough for an agent to work without further context.
- If the request is a question or needs no file changes, return an empty task list.
- Output ONLY valid JSON matching this schema, no other text:

{
  "plan_summary": "One or two sentences describing the overall plan",
  "tasks": [
    {
      "title": "Short task title",
      "description": "Detailed description of what the agent should do",
      "files_scope": ["path/to/file.rs", "src/module/*.rs"]
    }
  ]
}"#;

/// Messages for one planning request.
pub fn planning_messages(request: &str, tree: &FileTree) -> Vec<ChatMessage> {
    let mut listing = tree.render();
    if tree.is_empty() {
        listing.push_str("(empty repository)\n");
    }

    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Repository structure:\n```\n{}```\n\nUser request:\n{}",
            listing,
            request.trim()
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git_worktree::{TreeLimits, snapshot_tree};
    use crate::model::Role;
    use tempfile::TempDir;

    #[test]
    fn test_user_message_carries_tree_and_request() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("README.md"), "# hi\n").unwrap();
        let tree = snapshot_tree(
            dir.path(),
            TreeLimits {
                max_depth: 2,
                max_entries: 10,
            },
            &[],
        )
        .unwrap();

        let messages = planning_messages("  add a license  ", &tree);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[1].content.contains("README.md"));
        assert!(messages[1].content.ends_with("User request:\nadd a license"));
    }
}
