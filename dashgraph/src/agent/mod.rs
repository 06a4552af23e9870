//! The dashboard agent: model node, router, tool execution node and the turn executor.
//!
//! Graph shape:
//!
//! ```text
//! START -> model --(route)--> tools -> model ...
//!                 \--(route)--> END
//! ```
//!
//! The router sends the turn to `tools` when the model's first tool call names a
//! locally executable tool, and ends it otherwise (plain answer, or a call the caller
//! must execute). [`AgentExecutor`] loads the thread's latest checkpoint, merges the
//! turn input, runs the graph and commits exactly one new checkpoint per finished turn.

mod executor;
mod model_node;
mod router;
mod tool_node;

use std::time::Duration;

pub use executor::{AgentExecutor, RunError, TurnInput, TurnOutput};
pub use model_node::ModelNode;
pub use router::{route, AgentRouter, Route};
pub use tool_node::ToolNode;

use crate::graph::DEFAULT_RECURSION_LIMIT;
use crate::state::Language;

/// Node id of the model call.
pub const MODEL_NODE: &str = "model";
/// Node id of local tool execution.
pub const TOOLS_NODE: &str = "tools";

/// Default bound on one model call.
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(60);

/// System prompt for the given response language.
pub fn system_prompt(language: Language) -> String {
    format!("You are a helpful assistant. Talk in {}.", language)
}

/// Executor options.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Bound on each model call; expiry fails the turn with an endpoint error.
    pub model_timeout: Duration,
    /// Maximum node runs per turn.
    pub recursion_limit: usize,
    /// Wrap nodes with `LoggingNodeMiddleware`.
    pub node_logging: bool,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            model_timeout: DEFAULT_MODEL_TIMEOUT,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            node_logging: false,
        }
    }
}
