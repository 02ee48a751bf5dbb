//! Deciding whether a message asks for repository changes.

use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Conversational,
    Task,
}

/// Labels a message. Anything uncertain should be conversational.
pub trait MessageClassifier: Send + Sync {
    fn classify(&self, text: &str) -> MessageKind;
}

/// An imperative change verb near the start of the message.
static CHANGE_REQUEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        ^\s*
        (?:(?:please|pls|kindly|now|then|ok(?:ay)?|hey)[\s,]+)*
        (?:(?:can|could|would|will)\s+you\s+(?:please\s+)?)?
        (?:add|create|implement|fix|refactor|rename|remove|delete|update|write|change|modify|
           build|move|replace|introduce|migrate|extract|convert|generate|make|bump|upgrade)\b",
    )
    .expect("Invalid change request regex")
});

/// Something that lives in a repository.
static CODE_ARTIFACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        \b[\w./-]+\.[a-z0-9]{1,6}\b
        | \b(?:file|files|function|method|class|struct|module|crate|package|test|tests|endpoint|
              route|component|readme|license|config|dependency|script|bug|error|docs?|
              documentation|type|enum|trait|field|column|table|handler|api|cli|command)\b",
    )
    .expect("Invalid code artifact regex")
});

/// Keyword and shape heuristics: a change verb plus a code artifact.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicClassifier;

impl MessageClassifier for HeuristicClassifier {
    fn classify(&self, text: &str) -> MessageKind {
        let text = text.trim();
        if CHANGE_REQUEST.is_match(text) && CODE_ARTIFACT.is_match(text) {
            MessageKind::Task
        } else {
            MessageKind::Conversational
        }
    }
}
