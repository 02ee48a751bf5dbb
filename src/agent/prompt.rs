//! Agent prompts.

use crate::fs::{FileContents, ScopedFile};
use crate::llm::ChatMessage;
use crate::model::Task;
use std::fmt::Write as _;

const SYSTEM_PROMPT: &str = r#"You are a coding agent working on one task inside a larger mission. You work in an isolated git branch and may only change files inside your task's scope.

Reply with exactly one JSON object and no other text, in one of these shapes:

{"type": "edit_set",
 "rationale": "What you changed and why",
 "edits": [
   {"path": "relative/path.ext", "action": "write", "content": "COMPLETE new file content"},
   {"path": "relative/obsolete.ext", "action": "delete"}
 ],
 "complete": true}

{"type": "clarification", "question": "What you need to know"}

{"type": "completion", "summary": "Why the task is finished"}

Rules:
- Paths are relative to the repository root.
- "write" replaces the whole file; always send the complete content.
- Set "complete" to true when the task is done after these edits.
- Make minimal, focused changes. Do not touch files outside the scope."#;

/// One prior iteration, fed back to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Applied { files: Vec<String> },
    Rejected { reason: String },
    Clarification { question: String },
}

/// Messages for one iteration. The task heading leads the user message.
pub fn iteration_messages(
    task: &Task,
    files: &[ScopedFile],
    feedback: &[Feedback],
    iteration: u32,
    max_iterations: u32,
) -> Vec<ChatMessage> {
    let mut body = String::new();
    let _ = writeln!(body, "Task: {}\n", task.title);
    let _ = writeln!(body, "{}\n", task.description.trim());

    body.push_str("## File scope\n\n");
    if task.file_scope.is_empty() {
        body.push_str("Any file in the repository.\n");
    } else {
        for pattern in &task.file_scope {
            let _ = writeln!(body, "- {}", pattern);
        }
    }

    if !files.is_empty() {
        body.push_str("\n## Current files\n");
        for file in files {
            render_file(&mut body, file);
        }
    }

    if !feedback.is_empty() {
        body.push_str("\n## Previous iterations\n\n");
        for (i, item) in feedback.iter().enumerate() {
            let _ = write!(body, "{}. ", i + 1);
            match item {
                Feedback::Applied { files } => {
                    let _ = writeln!(body, "Applied edits to: {}", files.join(", "));
                }
                Feedback::Rejected { reason } => {
                    let _ = writeln!(body, "Your response was rejected: {}", reason);
                }
                Feedback::Clarification { question } => {
                    let _ = writeln!(
                        body,
                        "You asked \"{}\". No one can answer; decide using the task description.",
                        question
                    );
                }
            }
        }
    }

    let _ = write!(body, "\nIteration {} of {}.", iteration, max_iterations);

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(body)]
}

fn render_file(out: &mut String, file: &ScopedFile) {
    match &file.contents {
        FileContents::Text { text, truncated } => {
            let _ = writeln!(out, "\n### {}\n```\n{}\n```", file.path, text.trim_end());
            if *truncated {
                out.push_str("(truncated)\n");
            }
        }
        FileContents::Binary => {
            let _ = writeln!(out, "\n### {}\n(binary file, not shown)", file.path);
        }
        FileContents::NotFound => {
            let _ = writeln!(out, "\n### {}\n(does not exist yet)", file.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MissionId;

    #[test]
    fn test_iteration_message_layout() {
        let task = Task::new(
            MissionId::new(),
            0,
            "Write hello",
            "Create hello.txt",
            vec!["hello.txt".to_string()],
        );
        let files = vec![ScopedFile {
            path: "hello.txt".to_string(),
            contents: FileContents::NotFound,
        }];
        let feedback = vec![Feedback::Rejected {
            reason: "no JSON".to_string(),
        }];

        let messages = iteration_messages(&task, &files, &feedback, 2, 5);
        let user = &messages[1].content;
        assert!(user.starts_with("Task: Write hello\n"));
        assert!(user.contains("- hello.txt"));
        assert!(user.contains("### hello.txt\n(does not exist yet)"));
        assert!(user.contains("1. Your response was rejected: no JSON"));
        assert!(user.ends_with("Iteration 2 of 5."));
    }
}
