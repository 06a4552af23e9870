//! Compiled state graph: immutable, supports invoke and stream.
//!
//! Built by `StateGraph::compile` or a `compile_with_*` variant. When a checkpointer is
//! set and `config.thread_id` is provided, every step is staged with
//! `Checkpointer::put_step` and the final state is committed once when the run ends.
//! A failed run commits nothing.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;
use crate::memory::{CheckpointMetadata, CheckpointSource, Checkpointer, RunnableConfig};
use crate::stream::{StreamEvent, StreamMode};

use super::conditional::ConditionalRouter;
use super::logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_state_update,
};
use super::node_middleware::NodeMiddleware;
use super::state_graph::END;
use super::{Next, Node, RunContext};

/// Default maximum number of node runs per invoke.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// Result of a full run: final state, number of node runs, and the committed seq
/// (when a checkpointer and thread id were present).
#[derive(Debug, Clone)]
pub struct GraphOutcome<S> {
    pub state: S,
    pub steps: u64,
    pub checkpoint_seq: Option<u64>,
}

/// Compiled graph: immutable structure, supports invoke and stream.
///
/// Runs from the entry node; uses each node's returned `Next` and the node's outgoing
/// edge (plain or conditional) to choose the next node.
#[derive(Clone)]
pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) entry: String,
    pub(super) edges: HashMap<String, String>,
    pub(super) conditional: HashMap<String, ConditionalRouter<S>>,
    pub(super) checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    pub(super) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    pub(super) recursion_limit: usize,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    pub fn checkpointer(&self) -> Option<&Arc<dyn Checkpointer<S>>> {
        self.checkpointer.as_ref()
    }

    async fn run_node(
        &self,
        node_id: &str,
        state: S,
        run_ctx: &RunContext<S>,
    ) -> Result<(S, Next), AgentError> {
        let node = self
            .nodes
            .get(node_id)
            .cloned()
            .ok_or_else(|| AgentError::ExecutionFailed(format!("unknown node: {}", node_id)))?;

        match &self.middleware {
            Some(middleware) => {
                let ctx = run_ctx.clone();
                middleware
                    .around_run(
                        node_id,
                        state,
                        Box::new(move |s| {
                            Box::pin(async move { node.run_with_context(s, &ctx).await })
                        }),
                    )
                    .await
            }
            None => node.run_with_context(state, run_ctx).await,
        }
    }

    /// Next node id after `current_id`, or `None` for END.
    fn resolve_next(
        &self,
        current_id: &str,
        next: Next,
        state: &S,
    ) -> Result<Option<String>, AgentError> {
        let next = match next {
            Next::Continue => match self.conditional.get(current_id) {
                Some(router) => router.route(state)?,
                None => match self.edges.get(current_id) {
                    Some(to) if to == END => Next::End,
                    Some(to) => Next::Node(to.clone()),
                    None => {
                        return Err(AgentError::ExecutionFailed(format!(
                            "node has no outgoing edge: {}",
                            current_id
                        )))
                    }
                },
            },
            other => other,
        };
        log_node_complete(current_id, &next);
        Ok(match next {
            Next::Node(id) => Some(id),
            _ => None,
        })
    }

    /// Shared run loop used by invoke() and stream(): steps through nodes until END.
    async fn run_loop_inner(
        &self,
        mut state: S,
        run_ctx: &RunContext<S>,
    ) -> Result<GraphOutcome<S>, AgentError> {
        let config = &run_ctx.config;
        let checkpointer = self
            .checkpointer
            .as_ref()
            .filter(|_| config.thread_id.is_some());
        let mut current_id = self.entry.clone();
        let mut steps: u64 = 0;

        loop {
            if steps as usize >= self.recursion_limit {
                return Err(AgentError::ExecutionFailed(format!(
                    "recursion limit of {} reached without hitting END",
                    self.recursion_limit
                )));
            }
            let (new_state, next) = self.run_node(&current_id, state, run_ctx).await?;
            state = new_state;
            steps += 1;

            if let Some(cp) = checkpointer {
                cp.put_step(
                    config,
                    &state,
                    CheckpointMetadata::new(CheckpointSource::Loop, steps, Some(&current_id)),
                )
                .await?;
                log_state_update(&current_id, steps);
            }
            run_ctx.emit(&current_id, &state).await;

            match self.resolve_next(&current_id, next, &state)? {
                Some(id) => current_id = id,
                None => {
                    let checkpoint_seq = match checkpointer {
                        Some(cp) => Some(
                            cp.commit(
                                config,
                                &state,
                                CheckpointMetadata::new(
                                    CheckpointSource::Loop,
                                    steps,
                                    Some(&current_id),
                                ),
                            )
                            .await?,
                        ),
                        None => None,
                    };
                    return Ok(GraphOutcome {
                        state,
                        steps,
                        checkpoint_seq,
                    });
                }
            }
        }
    }

    /// Runs the graph and returns the full outcome.
    pub async fn run(&self, state: S, run_ctx: &RunContext<S>) -> Result<GraphOutcome<S>, AgentError> {
        log_graph_start(run_ctx.config.thread_id.as_deref());
        match self.run_loop_inner(state, run_ctx).await {
            Ok(outcome) => {
                log_graph_complete(outcome.steps, outcome.checkpoint_seq);
                Ok(outcome)
            }
            Err(e) => {
                log_graph_error(&e);
                Err(e)
            }
        }
    }

    /// Runs the graph with the given state and returns the final state.
    ///
    /// When `config` has `thread_id` and the graph was compiled with a checkpointer,
    /// steps are staged and the final state is committed.
    pub async fn invoke(&self, state: S, config: Option<RunnableConfig>) -> Result<S, AgentError> {
        let ctx = RunContext::new(config.unwrap_or_default());
        self.run(state, &ctx).await.map(|o| o.state)
    }

    /// Streams graph execution, emitting events via channel-backed Stream.
    ///
    /// Errors end the stream early; use `run` with a streaming `RunContext` to observe them.
    pub fn stream(
        &self,
        state: S,
        config: Option<RunnableConfig>,
        stream_mode: impl Into<HashSet<StreamMode>>,
    ) -> ReceiverStream<StreamEvent<S>> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        let ctx = RunContext::new(config.unwrap_or_default()).with_stream(tx, stream_mode);

        tokio::spawn(async move {
            let _ = graph.run(state, &ctx).await;
        });

        ReceiverStream::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio_stream::StreamExt;

    use crate::graph::{Next, Node, StateGraph, END, START};
    use crate::memory::{MemorySaver, RunnableConfig};
    use crate::stream::{StreamEvent, StreamMode};

    #[derive(Clone)]
    struct AddNode {
        id: &'static str,
        delta: i32,
    }

    #[async_trait]
    impl Node<i32> for AddNode {
        fn id(&self) -> &str {
            self.id
        }

        async fn run(&self, state: i32) -> Result<(i32, Next), AgentError> {
            Ok((state + self.delta, Next::Continue))
        }
    }

    /// Node that returns Next::End after one step.
    #[derive(Clone)]
    struct EndAfterNode {
        delta: i32,
    }

    #[async_trait]
    impl Node<i32> for EndAfterNode {
        fn id(&self) -> &str {
            "only"
        }
        async fn run(&self, state: i32) -> Result<(i32, Next), AgentError> {
            Ok((state + self.delta, Next::End))
        }
    }

    struct FailNode;

    #[async_trait]
    impl Node<i32> for FailNode {
        fn id(&self) -> &str {
            "fail"
        }
        async fn run(&self, _state: i32) -> Result<(i32, Next), AgentError> {
            Err(AgentError::Endpoint("down".into()))
        }
    }

    fn build_two_step_graph() -> CompiledStateGraph<i32> {
        let mut graph = StateGraph::<i32>::new();
        graph.add_node("first", Arc::new(AddNode { id: "first", delta: 1 }));
        graph.add_node("second", Arc::new(AddNode { id: "second", delta: 2 }));
        graph.add_edge(START, "first");
        graph.add_edge("first", "second");
        graph.add_edge("second", END);
        graph.compile().expect("graph compiles")
    }

    /// Loop: "work" adds 1; routes back to "work" until the state reaches `target`.
    fn build_loop_graph(target: i32, limit: usize) -> StateGraph<i32> {
        let mut graph = StateGraph::<i32>::new();
        graph.add_node("work", Arc::new(AddNode { id: "work", delta: 1 }));
        graph.add_edge(START, "work");
        graph.add_conditional_edges(
            "work",
            ConditionalRouter::new(move |s: &i32| {
                Ok(if *s < target { "again" } else { "done" }.to_string())
            })
            .with_path_map([("again", "work"), ("done", END)]),
        );
        graph.with_recursion_limit(limit);
        graph
    }

    /// **Scenario**: invoke runs nodes along edges in order.
    #[tokio::test]
    async fn invoke_follows_edges() {
        let out = build_two_step_graph().invoke(0, None).await.unwrap();
        assert_eq!(out, 3);
    }

    /// **Scenario**: A conditional edge can loop back; the run stops when it routes to END.
    #[tokio::test]
    async fn conditional_cycle_runs_until_end() {
        let graph = build_loop_graph(4, 25).compile().unwrap();
        let ctx = RunContext::new(RunnableConfig::default());
        let outcome = graph.run(0, &ctx).await.unwrap();
        assert_eq!(outcome.state, 4);
        assert_eq!(outcome.steps, 4);
        assert!(outcome.checkpoint_seq.is_none());
    }

    /// **Scenario**: A cycle that never reaches END fails with the recursion limit.
    #[tokio::test]
    async fn recursion_limit_stops_runaway_loop() {
        let graph = build_loop_graph(100, 5).compile().unwrap();
        match graph.invoke(0, None).await {
            Err(AgentError::ExecutionFailed(msg)) => assert!(msg.contains("recursion limit")),
            other => panic!("expected recursion limit error, got {:?}", other),
        }
    }

    /// **Scenario**: With a checkpointer, steps are staged and exactly one checkpoint is committed.
    #[tokio::test]
    async fn checkpointer_commits_once_per_run() {
        let cp = Arc::new(MemorySaver::<i32>::new());
        let graph = build_loop_graph(3, 25)
            .compile_with_checkpointer(cp.clone())
            .unwrap();
        let config = RunnableConfig::for_thread("t1");
        let outcome = graph
            .run(0, &RunContext::new(config.clone()))
            .await
            .unwrap();
        assert_eq!(outcome.checkpoint_seq, Some(1));
        let items = cp.list(&config, None).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].metadata.step, 3);
        assert!(cp.get_pending(&config).await.unwrap().is_none());
        assert_eq!(cp.get_tuple(&config).await.unwrap().unwrap().state, 3);
    }

    /// **Scenario**: Node returning Next::End commits when checkpointer and thread_id set.
    #[tokio::test]
    async fn invoke_next_end_with_checkpointer_saves_checkpoint() {
        let mut graph = StateGraph::<i32>::new();
        graph.add_node("only", Arc::new(EndAfterNode { delta: 5 }));
        graph.add_edge(START, "only");
        graph.add_edge("only", END);
        let cp = Arc::new(MemorySaver::<i32>::new());
        let compiled = graph.compile_with_checkpointer(cp.clone()).unwrap();
        let config = RunnableConfig::for_thread("tid-end");
        let out = compiled.invoke(0, Some(config.clone())).await.unwrap();
        assert_eq!(out, 5);
        assert!(cp.get_tuple(&config).await.unwrap().is_some());
    }

    /// **Scenario**: A failing node commits nothing; the staged step of the earlier node remains.
    #[tokio::test]
    async fn failure_commits_nothing() {
        let mut graph = StateGraph::<i32>::new();
        graph.add_node("first", Arc::new(AddNode { id: "first", delta: 1 }));
        graph.add_node("fail", Arc::new(FailNode));
        graph.add_edge(START, "first");
        graph.add_edge("first", "fail");
        graph.add_edge("fail", END);
        let cp = Arc::new(MemorySaver::<i32>::new());
        let compiled = graph.compile_with_checkpointer(cp.clone()).unwrap();
        let config = RunnableConfig::for_thread("t");
        let result = compiled.invoke(0, Some(config.clone())).await;
        assert!(matches!(result, Err(AgentError::Endpoint(_))));
        assert!(cp.get_tuple(&config).await.unwrap().is_none());
        assert_eq!(cp.get_pending(&config).await.unwrap().unwrap().state, 1);
    }

    /// **Scenario**: Node returning Next::Node(id) jumps to that node.
    #[tokio::test]
    async fn invoke_next_node_jumps_to_specified_node() {
        struct Jump;
        #[async_trait]
        impl Node<i32> for Jump {
            fn id(&self) -> &str {
                "first"
            }
            async fn run(&self, state: i32) -> Result<(i32, Next), AgentError> {
                Ok((state + 1, Next::Node("third".into())))
            }
        }
        let mut graph = StateGraph::<i32>::new();
        graph.add_node("first", Arc::new(Jump));
        graph.add_node("second", Arc::new(AddNode { id: "second", delta: 10 }));
        graph.add_node("third", Arc::new(AddNode { id: "third", delta: 100 }));
        graph.add_edge(START, "first");
        graph.add_edge("first", "second");
        graph.add_edge("second", "third");
        graph.add_edge("third", END);
        let out = graph.compile().unwrap().invoke(0, None).await.unwrap();
        assert_eq!(out, 101);
    }

    /// **Scenario**: stream(Values+Updates) emits both variants per node, Values first.
    #[tokio::test]
    async fn stream_values_and_updates_both_enabled() {
        let graph = build_two_step_graph();
        let stream = graph.stream(
            0,
            None,
            HashSet::from_iter([StreamMode::Values, StreamMode::Updates]),
        );
        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 4, "two nodes: two Values + two Updates");
        assert!(matches!(&events[0], StreamEvent::Values(1)));
        assert!(matches!(&events[1], StreamEvent::Updates { node_id, .. } if node_id == "first"));
        assert!(matches!(&events[2], StreamEvent::Values(3)));
        assert!(matches!(&events[3], StreamEvent::Updates { node_id, .. } if node_id == "second"));
    }

    /// **Scenario**: stream(updates) emits node ids in execution order for a cycle.
    #[tokio::test]
    async fn stream_updates_for_cycle() {
        let graph = build_loop_graph(2, 25).compile().unwrap();
        let events: Vec<_> = graph
            .stream(0, None, HashSet::from_iter([StreamMode::Updates]))
            .collect()
            .await;
        let states: Vec<i32> = events.iter().map(|e| *e.state()).collect();
        assert_eq!(states, vec![1, 2]);
    }
}
