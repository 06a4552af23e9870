//! Merge policy: append messages, replace scalars, enforce causal ordering.

use super::{ConversationState, StateUpdate};
use crate::error::AgentError;
use crate::message::{Message, ToolCall};

/// Tool calls that have been requested but not yet answered by a tool-result message,
/// in request order.
pub fn pending_tool_calls(messages: &[Message]) -> Vec<ToolCall> {
    let mut pending: Vec<ToolCall> = Vec::new();
    for m in messages {
        match m {
            Message::Assistant { tool_calls, .. } => pending.extend(tool_calls.iter().cloned()),
            Message::Tool { call_id, .. } => pending.retain(|c| &c.id != call_id),
            Message::User { .. } => {}
        }
    }
    pending
}

impl ConversationState {
    /// Folds `updates` into a copy of this state, in order.
    ///
    /// Fails with [`AgentError::SchemaViolation`] when an appended tool-result message
    /// does not answer exactly one pending tool call. The receiver is never modified.
    pub fn merge<I>(&self, updates: I) -> Result<ConversationState, AgentError>
    where
        I: IntoIterator<Item = StateUpdate>,
    {
        let mut next = self.clone();
        let mut pending: Vec<String> = pending_tool_calls(&next.messages)
            .into_iter()
            .map(|c| c.id)
            .collect();

        for update in updates {
            for message in update.messages {
                match &message {
                    Message::Assistant { tool_calls, .. } => {
                        pending.extend(tool_calls.iter().map(|c| c.id.clone()));
                    }
                    Message::Tool { call_id, name, .. } => {
                        let matching = pending.iter().filter(|id| *id == call_id).count();
                        if matching != 1 {
                            return Err(AgentError::SchemaViolation(format!(
                                "tool result for `{}` (call_id {}) matches {} pending tool calls, expected 1",
                                name, call_id, matching
                            )));
                        }
                        pending.retain(|id| id != call_id);
                    }
                    Message::User { .. } => {}
                }
                next.messages.push(message);
            }
            if let Some(language) = update.language {
                next.language = language;
            }
            if let Some(actions) = update.external_actions {
                next.external_actions = actions;
            }
        }
        Ok(next)
    }

    /// Convenience for a single update.
    pub fn apply(&self, update: StateUpdate) -> Result<ConversationState, AgentError> {
        self.merge(std::iter::once(update))
    }
}
