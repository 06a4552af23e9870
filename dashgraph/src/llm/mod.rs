//! Model adapter: the LLM client abstraction used by the model node.
//!
//! An [`LlmClient`] takes the system prompt, the full message history and the unified
//! tool schemas, and returns a [`ModelOutput`]: either plain text or one or more tool
//! calls. Clients are stateless between invocations; all context travels in `messages`.

mod mock;

#[cfg(feature = "openai")]
mod openai;

pub use mock::{MockLlm, MockReply};

#[cfg(feature = "openai")]
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::{Message, ToolCall};
use crate::tool_source::ToolSpec;

/// Output of one model invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// Natural-language answer; ends the turn.
    Text { content: String },
    /// One or more tool invocations, with any accompanying text.
    ToolCalls { content: String, calls: Vec<ToolCall> },
}

impl ModelOutput {
    pub fn text(content: impl Into<String>) -> Self {
        ModelOutput::Text {
            content: content.into(),
        }
    }

    /// Builds the output from raw parts; no calls means `Text`.
    pub fn from_parts(content: String, calls: Vec<ToolCall>) -> Self {
        if calls.is_empty() {
            ModelOutput::Text { content }
        } else {
            ModelOutput::ToolCalls { content, calls }
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            ModelOutput::Text { .. } => &[],
            ModelOutput::ToolCalls { calls, .. } => calls,
        }
    }

    /// The assistant message this output appends to the conversation.
    pub fn into_message(self) -> Message {
        match self {
            ModelOutput::Text { content } => Message::assistant(content),
            ModelOutput::ToolCalls { content, calls } => {
                Message::assistant_with_calls(content, calls)
            }
        }
    }
}

/// LLM client: given system prompt, messages and tool schemas, returns a [`ModelOutput`].
///
/// Implementations: `MockLlm` (scripted), `ChatOpenAI` (feature `openai`). Transport,
/// auth and malformed-response failures are reported as [`AgentError::Endpoint`].
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelOutput, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: from_parts picks Text for no calls and ToolCalls otherwise.
    #[test]
    fn from_parts_selects_variant() {
        assert_eq!(
            ModelOutput::from_parts("hi".into(), vec![]),
            ModelOutput::text("hi")
        );
        let call = ToolCall::new("c1", "getMarketMovers", json!({}));
        let out = ModelOutput::from_parts(String::new(), vec![call.clone()]);
        assert_eq!(out.tool_calls(), &[call.clone()]);
        assert_eq!(
            out.into_message(),
            Message::assistant_with_calls("", vec![call])
        );
    }
}
