//! Conversational mode: one completion over the session's recent history.

use super::Orchestrator;
use super::narration;
use crate::error::{AetherError, Result};
use crate::git_worktree::FileTree;
use crate::llm::{ChatMessage, complete_with_timeout};
use crate::model::ConversationEntry;
use tracing::{debug, instrument, warn};

const SYSTEM_INSTRUCTION: &str = "You are Aether, an engineering assistant that coordinates \
coding agents working on a git repository. Answer questions directly and concisely. \
When the user asks for a code change, say what you would change; the change itself is carried \
out by your agents, not by you.";

impl Orchestrator {
    /// Answer `text` conversationally. With `context`, the answer is grounded
    /// in the repository listing.
    #[instrument(skip(self, text, context), fields(grounded = context.is_some()))]
    pub(super) async fn converse(
        &self,
        session_id: &str,
        text: &str,
        context: Option<&FileTree>,
    ) -> String {
        match self.try_converse(session_id, text, context).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "conversational reply failed");
                narration::conversation_failure(&e)
            }
        }
    }

    async fn try_converse(
        &self,
        session_id: &str,
        text: &str,
        context: Option<&FileTree>,
    ) -> Result<String> {
        let history = self
            .store
            .recent_conversation(session_id, self.config.history_window)
            .await?;
        debug!(entries = history.len(), "loaded conversation history");

        let messages = conversation_messages(&history, text, context);
        let reply = complete_with_timeout(self.llm.as_ref(), &messages, self.config.llm.timeout())
            .await
            .map_err(AetherError::Transport)?;

        self.append_exchange(session_id, text, &reply).await?;
        Ok(reply)
    }

    /// Record one user message and its reply, in that order.
    pub(super) async fn append_exchange(
        &self,
        session_id: &str,
        text: &str,
        reply: &str,
    ) -> Result<()> {
        self.store
            .append_conversation(&ConversationEntry::user(session_id, text))
            .await?;
        self.store
            .append_conversation(&ConversationEntry::assistant(session_id, reply))
            .await
    }
}

fn conversation_messages(
    history: &[ConversationEntry],
    text: &str,
    context: Option<&FileTree>,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(SYSTEM_INSTRUCTION));
    messages.extend(
        history
            .iter()
            .map(|entry| ChatMessage::new(entry.role, entry.content.clone())),
    );
    let user = match context {
        Some(tree) => format!(
            "Repository structure:\n```\n{}```\n\n{}",
            tree.render(),
            text
        ),
        None => text.to_string(),
    };
    messages.push(ChatMessage::user(user));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_precedes_the_new_message() {
        let history = vec![
            ConversationEntry::user("s", "hello"),
            ConversationEntry::assistant("s", "hi there"),
        ];
        let messages = conversation_messages(&history, "what now?", None);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].content, SYSTEM_INSTRUCTION);
        assert_eq!(messages[1].content, "hello");
        assert_eq!(messages[2].content, "hi there");
        assert_eq!(messages[3].content, "what now?");
    }
}
