//! Shared state and nodes for StateGraph integration tests.

use async_trait::async_trait;
use dashgraph::{AgentError, Next, Node};

/// Records the nodes that ran, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    pub visits: Vec<String>,
    pub count: u32,
}

/// Appends its id and increments the count; returns a fixed `Next`.
pub struct StepNode {
    id: &'static str,
    next: Next,
}

impl StepNode {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            next: Next::Continue,
        }
    }

    pub fn with_next(id: &'static str, next: Next) -> Self {
        Self { id, next }
    }
}

#[async_trait]
impl Node<Tally> for StepNode {
    fn id(&self) -> &str {
        self.id
    }

    async fn run(&self, mut state: Tally) -> Result<(Tally, Next), AgentError> {
        state.visits.push(self.id.to_string());
        state.count += 1;
        Ok((state, self.next.clone()))
    }
}
