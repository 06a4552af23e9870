//! Next step after a node runs.

/// Routing decision returned by a node alongside its new state.
///
/// - `Continue`: follow the node's outgoing edge (plain or conditional).
/// - `Node(id)`: jump to the node with that id.
/// - `End`: stop the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    Continue,
    Node(String),
    End,
}
