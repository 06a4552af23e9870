//! Streaming types for graph runs.
//!
//! Defines stream modes and events for value and update streaming. Used by
//! `CompiledStateGraph::stream` and `AgentExecutor::stream_turn`.

use std::fmt::Debug;

/// Stream mode selector: which kinds of events to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Emit full state after each node completes.
    Values,
    /// Emit incremental updates with node id and state.
    Updates,
}

/// Streamed event emitted while running a graph.
#[derive(Clone, Debug)]
pub enum StreamEvent<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Full state snapshot after a node finishes.
    Values(S),
    /// Update with the node id and state after that node.
    Updates { node_id: String, state: S },
}

impl<S> StreamEvent<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn state(&self) -> &S {
        match self {
            StreamEvent::Values(s) | StreamEvent::Updates { state: s, .. } => s,
        }
    }
}
