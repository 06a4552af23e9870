//! Logging helpers for graph execution, on top of `tracing`.

use tracing::{debug, error, info};

use crate::error::AgentError;
use crate::graph::Next;

/// Log node execution start.
pub fn log_node_start(node_id: &str) {
    debug!(node_id, "starting node execution");
}

/// Log node execution completion with the chosen next step.
pub fn log_node_complete(node_id: &str, next: &Next) {
    debug!(node_id, ?next, "node execution complete");
}

/// Log a node that returned an error.
pub fn log_node_error(node_id: &str, error: &AgentError) {
    debug!(node_id, %error, "node execution failed");
}

/// Log a staged step snapshot.
pub fn log_state_update(node_id: &str, step: u64) {
    debug!(node_id, step, "state updated");
}

/// Log graph execution start.
pub fn log_graph_start(thread_id: Option<&str>) {
    info!(thread_id, "starting graph execution");
}

/// Log graph execution completion.
pub fn log_graph_complete(steps: u64, checkpoint_seq: Option<u64>) {
    info!(steps, checkpoint_seq, "graph execution complete");
}

/// Log graph execution error.
pub fn log_graph_error(error: &AgentError) {
    error!(%error, "graph execution error");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_functions() {
        log_node_start("test_node");
        log_node_complete("test_node", &Next::End);
        log_node_error("test_node", &AgentError::Endpoint("x".into()));
        log_state_update("test_node", 1);
        log_graph_start(Some("t1"));
        log_graph_complete(2, Some(1));
        log_graph_error(&AgentError::ExecutionFailed("test".to_string()));
    }
}
