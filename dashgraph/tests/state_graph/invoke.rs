//! Invoke output: linear chains, conditional loops, recursion limit, checkpointing.

use std::sync::Arc;

use dashgraph::{
    AgentError, Checkpointer, ConditionalRouter, MemorySaver, Next, RunnableConfig, StateGraph,
    END, START,
};

use crate::common::{StepNode, Tally};

#[tokio::test]
async fn invoke_runs_linear_chain() {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("a", Arc::new(StepNode::new("a")))
        .add_node("b", Arc::new(StepNode::new("b")))
        .add_edge(START, "a")
        .add_edge("a", "b")
        .add_edge("b", END);
    let compiled = graph.compile().expect("compile");

    let out = compiled.invoke(Tally::default(), None).await.unwrap();
    assert_eq!(out.visits, vec!["a", "b"]);
}

/// **Scenario**: A conditional loop runs until the router sends it to END.
#[tokio::test]
async fn conditional_loop_until_done() {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("work", Arc::new(StepNode::new("work")))
        .add_node("check", Arc::new(StepNode::new("check")))
        .add_edge(START, "work")
        .add_edge("check", "work")
        .add_conditional_edges(
            "work",
            ConditionalRouter::new(|s: &Tally| {
                Ok(if s.count >= 5 { "done" } else { "again" }.to_string())
            })
            .with_path_map([("again", "check"), ("done", END)]),
        );
    let compiled = graph.compile().unwrap();

    let out = compiled.invoke(Tally::default(), None).await.unwrap();
    assert_eq!(out.visits, vec!["work", "check", "work", "check", "work"]);
}

/// **Scenario**: A loop that never ends fails with the recursion limit.
#[tokio::test]
async fn recursion_limit_stops_runaway_loop() {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("spin", Arc::new(StepNode::new("spin")))
        .add_edge(START, "spin")
        .add_conditional_edges(
            "spin",
            ConditionalRouter::new(|_: &Tally| Ok("again".to_string()))
                .with_path_map([("again", "spin"), ("done", END)]),
        )
        .with_recursion_limit(4);
    let compiled = graph.compile().unwrap();

    match compiled.invoke(Tally::default(), None).await {
        Err(AgentError::ExecutionFailed(msg)) => assert!(msg.contains("recursion limit"), "{}", msg),
        other => panic!("expected ExecutionFailed, got {:?}", other),
    }
}

/// **Scenario**: Next::End from a node skips its outgoing edge.
#[tokio::test]
async fn node_can_end_early() {
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("a", Arc::new(StepNode::with_next("a", Next::End)))
        .add_node("b", Arc::new(StepNode::new("b")))
        .add_edge(START, "a")
        .add_edge("a", "b")
        .add_edge("b", END);
    let out = graph.compile().unwrap().invoke(Tally::default(), None).await.unwrap();
    assert_eq!(out.visits, vec!["a"]);
}

/// **Scenario**: With a checkpointer and a thread id, one run commits exactly one checkpoint.
#[tokio::test]
async fn invoke_with_checkpointer_commits_once() {
    let saver: Arc<MemorySaver<Tally>> = Arc::new(MemorySaver::new());
    let mut graph = StateGraph::<Tally>::new();
    graph
        .add_node("a", Arc::new(StepNode::new("a")))
        .add_node("b", Arc::new(StepNode::new("b")))
        .add_edge(START, "a")
        .add_edge("a", "b")
        .add_edge("b", END);
    let compiled = graph.compile_with_checkpointer(saver.clone()).unwrap();

    let config = RunnableConfig::for_thread("t1");
    compiled
        .invoke(Tally::default(), Some(config.clone()))
        .await
        .unwrap();

    let list = saver.list(&config, None).await.unwrap();
    assert_eq!(list.len(), 1);
    let latest = saver.get_tuple(&config).await.unwrap().unwrap();
    assert_eq!(latest.state.count, 2);
    assert!(saver.get_pending(&config).await.unwrap().is_none());
}
