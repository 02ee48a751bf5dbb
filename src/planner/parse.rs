//! Planner response schema.

use super::{Plan, PlannedTask};
use crate::agent::ScopeGuard;
use crate::error::{AetherError, Result};
use crate::llm::json::extract_json_object;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default)]
    plan_summary: Option<String>,
    tasks: Vec<RawTask>,
}

#[derive(Debug, Deserialize)]
struct RawTask {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default, alias = "file_scope")]
    files_scope: Vec<String>,
}

/// Parse and validate a planner response.
///
/// Anything short of a complete, valid plan is `AetherError::Planning`.
/// A well-formed plan with no tasks is valid.
pub fn parse_plan(text: &str) -> Result<Plan> {
    let value = extract_json_object(text).ok_or_else(|| {
        AetherError::Planning(format!(
            "planner response contained no JSON object: {}",
            excerpt(text)
        ))
    })?;

    let raw: RawPlan = serde_json::from_value(value)
        .map_err(|e| AetherError::Planning(format!("planner response has the wrong shape: {}", e)))?;

    let mut tasks = Vec::with_capacity(raw.tasks.len());
    for (index, task) in raw.tasks.into_iter().enumerate() {
        let title = task.title.trim().to_string();
        if title.is_empty() {
            return Err(AetherError::Planning(format!(
                "task {} has an empty title",
                index + 1
            )));
        }

        let file_scope: Vec<String> = task
            .files_scope
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        ScopeGuard::new(&file_scope).map_err(|e| {
            AetherError::Planning(format!("task '{}' has an unusable scope: {}", title, e))
        })?;

        let description = match task.description.trim() {
            "" => title.clone(),
            d => d.to_string(),
        };

        tasks.push(PlannedTask {
            title,
            description,
            file_scope,
        });
    }

    let summary = raw
        .plan_summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(Plan { summary, tasks })
}

fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(200).collect();
    if out.len() < text.len() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_fenced_plan() {
        let text = r#"Here is the plan:
```json
{
  "plan_summary": "Add a greeting file",
  "tasks": [
    {"title": "Write hello", "description": "Create hello.txt", "files_scope": ["hello.txt"], "depends_on": [], "priority": "General"}
  ]
}
```"#;
        let plan = parse_plan(text).unwrap();
        assert_eq!(plan.summary.as_deref(), Some("Add a greeting file"));
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].title, "Write hello");
        assert_eq!(plan.tasks[0].file_scope, vec!["hello.txt".to_string()]);
    }

    #[test]
    fn test_accepts_file_scope_alias_and_missing_description() {
        let plan = parse_plan(r#"{"tasks":[{"title":"Docs","file_scope":["docs/**"]}]}"#).unwrap();
        assert_eq!(plan.summary, None);
        assert_eq!(plan.tasks[0].description, "Docs");
        assert_eq!(plan.tasks[0].file_scope, vec!["docs/**".to_string()]);
    }

    #[test]
    fn test_empty_task_list_is_valid() {
        let plan = parse_plan(r#"{"plan_summary":"Nothing to change","tasks":[]}"#).unwrap();
        assert!(plan.tasks.is_empty());
    }

    #[test]
    fn test_malformed_output_is_planning_error() {
        for text in [
            "I think you should edit main.rs",
            r#"{"plan_summary":"no tasks key"}"#,
            r#"{"tasks":[{"description":"untitled"}]}"#,
            r#"{"tasks":[{"title":"   "}]}"#,
            r#"{"tasks":[{"title":"Escape","files_scope":["../etc/passwd"]}]}"#,
        ] {
            let err = parse_plan(text).unwrap_err();
            assert!(matches!(err, AetherError::Planning(_)), "{}", text);
        }
    }
}
