//! Graph compilation error.
//!
//! Returned by `StateGraph::compile` when edges reference unknown nodes or the
//! wiring cannot reach END.

use thiserror::Error;

/// Error when compiling a state graph.
///
/// Validation ensures every id in edges and conditional targets (except START/END)
/// is a registered node, there is exactly one entry edge, every node has exactly
/// one outgoing edge (plain or conditional), and END is reachable.
#[derive(Debug, Error, PartialEq)]
pub enum CompilationError {
    /// A node id in an edge was not registered via `add_node` (and is not START/END).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge has from_id == START, or more than one such edge.
    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// No edge or conditional route leads to END.
    #[error("graph must have a path to END")]
    MissingEnd,

    /// A node has no outgoing edge.
    #[error("node has no outgoing edge: {0}")]
    NoOutgoingEdge(String),

    /// A node has more than one outgoing edge, or both a plain and a conditional edge.
    #[error("node has more than one outgoing edge: {0}")]
    DuplicateOutgoingEdge(String),
}
