//! State graph: nodes, plain and conditional edges, compile and invoke.
//!
//! Build a `StateGraph`, compile it (optionally with a checkpointer and node
//! middleware), then `invoke`, `run` or `stream` it with a state.

mod compile_error;
mod compiled;
mod conditional;
mod logging;
mod logging_middleware;
mod next;
mod node;
mod node_middleware;
mod run_context;
mod state_graph;

pub use compile_error::CompilationError;
pub use compiled::{CompiledStateGraph, GraphOutcome, DEFAULT_RECURSION_LIMIT};
pub use conditional::{ConditionalRouter, ConditionalRouterFn};
pub use logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_error,
    log_node_start, log_state_update,
};
pub use logging_middleware::LoggingNodeMiddleware;
pub use next::Next;
pub use node::Node;
pub use node_middleware::{NodeMiddleware, NodeRunFn};
pub use run_context::RunContext;
pub use state_graph::{StateGraph, END, START};
