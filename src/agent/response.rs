//! Agent response variants.
//!
//! ```json
//! {"type": "edit_set", "rationale": "...", "complete": true,
//!  "edits": [{"path": "src/a.rs", "action": "write", "content": "..."},
//!            {"path": "old.rs", "action": "delete"}]}
//! {"type": "clarification", "question": "..."}
//! {"type": "completion", "summary": "..."}
//! ```
//!
//! The untagged `{"analysis", "changes": [{"file_path", "action", "content"}],
//! "summary"}` shape is accepted as an edit set that completes the task.

use crate::llm::json::extract_json_object;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// One file edit proposed by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEdit {
    Write { path: String, content: String },
    Delete { path: String },
}

impl FileEdit {
    pub fn path(&self) -> &str {
        match self {
            FileEdit::Write { path, .. } | FileEdit::Delete { path } => path,
        }
    }
}

/// A validated model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentResponse {
    EditSet {
        rationale: String,
        edits: Vec<FileEdit>,
        complete: bool,
    },
    Clarification {
        question: String,
    },
    Completion {
        summary: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    #[error("response contained no JSON object")]
    NoJson,

    #[error("response JSON does not match any known shape: {0}")]
    Shape(String),

    #[error("edit {index} is invalid: {reason}")]
    InvalidEdit { index: usize, reason: String },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Tagged {
    EditSet {
        #[serde(default)]
        rationale: String,
        #[serde(default)]
        edits: Vec<RawEdit>,
        #[serde(default)]
        complete: bool,
    },
    Clarification {
        question: String,
    },
    Completion {
        #[serde(default)]
        summary: String,
    },
}

#[derive(Deserialize)]
struct RawEdit {
    #[serde(alias = "file_path")]
    path: String,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Legacy {
    #[serde(default)]
    analysis: String,
    changes: Vec<RawEdit>,
    #[serde(default)]
    summary: String,
}

/// Parse model output into an [`AgentResponse`].
pub fn parse_agent_response(text: &str) -> Result<AgentResponse, ResponseError> {
    let value = extract_json_object(text).ok_or(ResponseError::NoJson)?;

    if value.get("type").is_some() {
        let tagged: Tagged =
            serde_json::from_value(value).map_err(|e| ResponseError::Shape(e.to_string()))?;
        return Ok(match tagged {
            Tagged::EditSet {
                rationale,
                edits,
                complete,
            } => AgentResponse::EditSet {
                rationale,
                edits: convert_edits(edits)?,
                complete,
            },
            Tagged::Clarification { question } => AgentResponse::Clarification { question },
            Tagged::Completion { summary } => AgentResponse::Completion { summary },
        });
    }

    legacy(value)
}

fn legacy(value: Value) -> Result<AgentResponse, ResponseError> {
    let legacy: Legacy =
        serde_json::from_value(value).map_err(|e| ResponseError::Shape(e.to_string()))?;
    let rationale = match (legacy.analysis.trim(), legacy.summary.trim()) {
        ("", summary) => summary.to_string(),
        (analysis, "") => analysis.to_string(),
        (analysis, summary) => format!("{}\n\n{}", analysis, summary),
    };
    Ok(AgentResponse::EditSet {
        rationale,
        edits: convert_edits(legacy.changes)?,
        complete: true,
    })
}

fn convert_edits(raw: Vec<RawEdit>) -> Result<Vec<FileEdit>, ResponseError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, edit)| {
            let invalid = |reason: &str| ResponseError::InvalidEdit {
                index,
                reason: reason.to_string(),
            };
            if edit.path.trim().is_empty() {
                return Err(invalid("missing path"));
            }
            match edit.action.as_deref().unwrap_or("write") {
                "write" | "create" | "modify" | "update" => match edit.content {
                    Some(content) => Ok(FileEdit::Write {
                        path: edit.path,
                        content,
                    }),
                    None => Err(invalid("write without content")),
                },
                "delete" | "remove" => Ok(FileEdit::Delete { path: edit.path }),
                other => Err(ResponseError::InvalidEdit {
                    index,
                    reason: format!("unknown action '{}'", other),
                }),
            }
        })
        .collect()
}
