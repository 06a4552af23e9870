//! compile_with_middleware: the middleware wraps every node run.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashgraph::graph::{LoggingNodeMiddleware, NodeRunFn};
use dashgraph::{AgentError, Next, NodeMiddleware, StateGraph, END, START};

use crate::common::{StepNode, Tally};

struct CountingMiddleware {
    calls: AtomicUsize,
}

#[async_trait]
impl NodeMiddleware<Tally> for CountingMiddleware {
    async fn around_run(
        &self,
        _node_id: &str,
        state: Tally,
        inner: NodeRunFn<Tally>,
    ) -> Result<(Tally, Next), AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        inner(state).await
    }
}

fn two_step_graph() -> StateGraph<Tally> {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("a", Arc::new(StepNode::new("a")))
        .add_node("b", Arc::new(StepNode::new("b")))
        .add_edge(START, "a")
        .add_edge("a", "b")
        .add_edge("b", END);
    graph
}

#[tokio::test]
async fn middleware_wraps_each_node() {
    let middleware = Arc::new(CountingMiddleware {
        calls: AtomicUsize::new(0),
    });
    let compiled = two_step_graph()
        .compile_with_middleware(middleware.clone())
        .unwrap();

    let out = compiled.invoke(Tally::default(), None).await.unwrap();
    assert_eq!(out.visits, vec!["a", "b"]);
    assert_eq!(middleware.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn logging_middleware_passes_state_through() {
    let compiled = two_step_graph()
        .compile_with_middleware(Arc::new(LoggingNodeMiddleware::<Tally>::new()))
        .unwrap();
    let out = compiled.invoke(Tally::default(), None).await.unwrap();
    assert_eq!(out.count, 2);
}
