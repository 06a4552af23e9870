//! Router: decides whether the turn continues with local tool execution or ends.

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::AgentError;
use crate::graph::{ConditionalRouter, END};
use crate::message::Message;
use crate::registry::{ToolRegistry, UnifiedToolSet};
use crate::state::ConversationState;

use super::TOOLS_NODE;

/// Where the turn goes after a model step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Run the requested local tools, then call the model again.
    ToolExecution,
    /// End the turn: plain answer, or calls the caller has to execute.
    Terminate,
}

impl Route {
    /// Key used in the graph's conditional edge.
    pub fn key(self) -> &'static str {
        match self {
            Route::ToolExecution => "tools",
            Route::Terminate => "end",
        }
    }
}

/// Routes on the latest model output.
///
/// No tool calls: `Terminate`. Otherwise only the first call is inspected: an
/// externally owned tool ends the turn so the caller can run it, anything else goes
/// to tool execution.
pub fn route(latest: &Message, tools: &UnifiedToolSet) -> Route {
    match latest.tool_calls().first() {
        None => Route::Terminate,
        Some(call) if tools.is_external(&call.name) => Route::Terminate,
        Some(_) => Route::ToolExecution,
    }
}

/// State-level router over the registry; plugs into the graph as a conditional edge.
#[derive(Clone)]
pub struct AgentRouter {
    registry: Arc<ToolRegistry>,
}

impl AgentRouter {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Routes on the last message of `state`, which must be the model's output.
    pub fn route_state(&self, state: &ConversationState) -> Result<Route, AgentError> {
        let latest = state.last_assistant().ok_or_else(|| {
            AgentError::SchemaViolation(
                "routing requires the latest message to be an assistant message".into(),
            )
        })?;
        let tools = self.registry.unify(&state.external_actions);
        Ok(route(latest, &tools))
    }

    /// Conditional edge for the model node: `tools` -> tool node, `end` -> END.
    pub fn into_conditional(self) -> ConditionalRouter<ConversationState> {
        ConditionalRouter::new(move |state: &ConversationState| {
            self.route_state(state).map(|r| r.key().to_string())
        })
        .with_path_map([
            (Route::ToolExecution.key(), TOOLS_NODE),
            (Route::Terminate.key(), END),
        ])
    }
}

impl Debug for AgentRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRouter")
            .field("local_tools", &self.registry.local_tools().len())
            .finish()
    }
}
