//! StateGraph compile failure cases: unknown node, missing entry, unreachable END.

use std::sync::Arc;

use dashgraph::{CompilationError, ConditionalRouter, StateGraph, END, START};

use crate::common::{StepNode, Tally};

#[tokio::test]
async fn compile_fails_when_edge_refers_to_unknown_node() {
    let mut graph = StateGraph::<Tally>::new();
    graph.add_node("a", Arc::new(StepNode::new("a")));
    graph.add_edge(START, "a");
    graph.add_edge("a", "missing");

    match graph.compile() {
        Err(CompilationError::NodeNotFound(id)) => assert_eq!(id, "missing"),
        other => panic!("expected NodeNotFound, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn compile_fails_without_start_edge() {
    let mut graph = StateGraph::<Tally>::new();
    graph.add_node("a", Arc::new(StepNode::new("a")));
    graph.add_edge("a", END);

    assert_eq!(graph.compile().err(), Some(CompilationError::MissingStart));
}

#[tokio::test]
async fn compile_fails_when_node_has_no_outgoing_edge() {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("a", Arc::new(StepNode::new("a")))
        .add_node("b", Arc::new(StepNode::new("b")))
        .add_edge(START, "a")
        .add_edge("a", END);

    assert_eq!(
        graph.compile().err(),
        Some(CompilationError::NoOutgoingEdge("b".into()))
    );
}

/// **Scenario**: A closed loop without a route to END is rejected.
#[tokio::test]
async fn compile_fails_when_end_is_unreachable() {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("a", Arc::new(StepNode::new("a")))
        .add_node("b", Arc::new(StepNode::new("b")))
        .add_edge(START, "a")
        .add_edge("a", "b")
        .add_edge("b", "a");

    assert_eq!(graph.compile().err(), Some(CompilationError::MissingEnd));
}

/// **Scenario**: A node with both a plain and a conditional edge is rejected.
#[tokio::test]
async fn compile_fails_on_plain_and_conditional_edge() {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("a", Arc::new(StepNode::new("a")))
        .add_edge(START, "a")
        .add_edge("a", END)
        .add_conditional_edges(
            "a",
            ConditionalRouter::new(|_: &Tally| Ok("end".to_string()))
                .with_path_map([("end", END)]),
        );

    assert_eq!(
        graph.compile().err(),
        Some(CompilationError::DuplicateOutgoingEdge("a".into()))
    );
}

/// **Scenario**: A conditional target that is not a node is rejected.
#[tokio::test]
async fn compile_fails_on_unknown_conditional_target() {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("a", Arc::new(StepNode::new("a")))
        .add_edge(START, "a")
        .add_conditional_edges(
            "a",
            ConditionalRouter::new(|_: &Tally| Ok("x".to_string()))
                .with_path_map([("x", "nowhere"), ("end", END)]),
        );

    assert_eq!(
        graph.compile().err(),
        Some(CompilationError::NodeNotFound("nowhere".into()))
    );
}
