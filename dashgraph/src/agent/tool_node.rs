//! Tool execution node: run the latest assistant message's local tool calls
//! concurrently and append one tool-result message per call.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, trace, warn};

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::message::{Message, ToolCall};
use crate::registry::{ToolRegistry, UnifiedToolSet};
use crate::state::{ConversationState, StateUpdate};
use crate::tool_source::{ToolSource, ToolSourceError};

use super::TOOLS_NODE;

/// Error payload for a failed tool call.
const TOOL_ERROR_TEMPLATE: &str =
    "Error executing tool '{tool_name}' with arguments {tool_args}: {error}. Please fix the error and try again.";

/// Truncates a string for logging, appending "..." if longer than max_len.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

fn error_payload(call: &ToolCall, error: &ToolSourceError) -> String {
    TOOL_ERROR_TEMPLATE
        .replace("{tool_name}", &call.name)
        .replace("{tool_args}", &call.arguments.to_string())
        .replace("{error}", &error.to_string())
}

/// Tool node: executes the pending calls of the latest assistant message.
///
/// Locally owned calls run concurrently against the [`ToolSource`] and are all joined
/// before the node returns. Failures, calls to externally owned tools and calls to
/// unknown tools each produce an error tool result (`is_error = true`), so every call
/// gets exactly one result and the step never aborts on a tool failure. Control always
/// returns to the model node.
///
/// **Interaction**: Implements `Node<ConversationState>`; reached from the model node
/// when the router picks `Route::ToolExecution`.
pub struct ToolNode {
    tools: Arc<dyn ToolSource>,
    registry: Arc<ToolRegistry>,
}

impl ToolNode {
    pub fn new(tools: Arc<dyn ToolSource>, registry: Arc<ToolRegistry>) -> Self {
        Self { tools, registry }
    }

    async fn execute(&self, call: &ToolCall, set: &UnifiedToolSet) -> Message {
        if set.is_external(&call.name) {
            warn!(tool = %call.name, call_id = %call.id, "external tool call not executed in-graph");
            return Message::tool_error(
                &call.id,
                &call.name,
                format!(
                    "Tool '{}' is executed by the client and was not run in this step. Call it on its own to hand it to the client.",
                    call.name
                ),
            );
        }
        if !set.is_local(&call.name) {
            warn!(tool = %call.name, call_id = %call.id, "unknown tool requested");
            return Message::tool_error(
                &call.id,
                &call.name,
                error_payload(call, &ToolSourceError::NotFound(call.name.clone())),
            );
        }

        debug!(tool = %call.name, args = %call.arguments, "calling tool");
        match self.tools.call_tool(&call.name, call.arguments.clone()).await {
            Ok(content) => {
                trace!(
                    tool = %call.name,
                    result_len = content.text.len(),
                    result_preview = %truncate_for_log(&content.text, 200),
                    "tool returned"
                );
                Message::tool_result(&call.id, &call.name, content.text)
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool call failed");
                Message::tool_error(&call.id, &call.name, error_payload(call, &e))
            }
        }
    }
}

#[async_trait]
impl Node<ConversationState> for ToolNode {
    fn id(&self) -> &str {
        TOOLS_NODE
    }

    async fn run(&self, state: ConversationState) -> Result<(ConversationState, Next), AgentError> {
        let calls = state
            .last_assistant()
            .map(|m| m.tool_calls().to_vec())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                AgentError::SchemaViolation(
                    "tool execution requires an assistant message with tool calls".into(),
                )
            })?;

        let set = self.registry.unify(&state.external_actions);
        let results = join_all(calls.iter().map(|call| self.execute(call, &set))).await;

        let next = state.apply(StateUpdate::messages(results))?;
        Ok((next, Next::Continue))
    }
}
