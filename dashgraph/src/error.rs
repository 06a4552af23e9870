//! Agent execution error types.
//!
//! Returned by graph nodes, the state merge and the model adapter. Tool-level and
//! descriptor-level failures have their own types ([`ToolSourceError`](crate::ToolSourceError),
//! [`ToolDescriptorError`](crate::ToolDescriptorError)) because they are recoverable and
//! folded into state instead of aborting a turn.

use thiserror::Error;

use crate::memory::CheckpointError;

/// Fatal error for a step or a turn.
///
/// Every variant aborts the current turn; the executor never commits a checkpoint
/// after one of these, so the last committed state stays authoritative.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A state update targeted an unknown field, carried a value of the wrong type,
    /// or appended messages that break causal ordering (e.g. orphan tool result).
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// The model endpoint was unreachable, rejected the request, or timed out.
    #[error("model endpoint error: {0}")]
    Endpoint(String),

    /// Execution failed with a message (e.g. recursion limit reached, empty graph).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Staging or committing a checkpoint failed inside the graph loop.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl AgentError {
    /// True when the error came from the model endpoint (transport, auth or timeout).
    pub fn is_endpoint(&self) -> bool {
        matches!(self, AgentError::Endpoint(_))
    }
}
