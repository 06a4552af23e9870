//! Turn executor: load the thread's checkpoint, merge the turn input, run the agent
//! graph, commit once.
//!
//! One turn is one call to [`AgentExecutor::run_turn`] (or [`AgentExecutor::stream_turn`]).
//! Turns on the same thread are serialized; distinct threads run concurrently.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

use crate::error::AgentError;
use crate::graph::{
    CompilationError, CompiledStateGraph, LoggingNodeMiddleware, RunContext, StateGraph, START,
};
use crate::llm::LlmClient;
use crate::memory::{
    CheckpointError, CheckpointListItem, CheckpointMetadata, CheckpointSource, Checkpointer,
    RunnableConfig,
};
use crate::message::{Message, ToolCall};
use crate::registry::{ToolDescriptor, ToolDescriptorError, ToolRegistry};
use crate::state::{pending_tool_calls, ConversationState, Language, StateUpdate};
use crate::stream::{StreamEvent, StreamMode};
use crate::tool_source::{ToolSource, ToolSourceError};

use super::{AgentOptions, AgentRouter, ModelNode, ToolNode, MODEL_NODE, TOOLS_NODE};

/// Content of the error result that closes a call nobody answered.
const UNANSWERED_CALL: &str = "No result was returned for this call.";

/// Input of one turn.
#[derive(Debug, Clone, Default)]
pub struct TurnInput {
    pub thread_id: String,
    /// New user message, or a tool message answering a pending external call.
    pub new_message: Option<Message>,
    /// Replaces the thread's language when present.
    pub language: Option<Language>,
    /// Caller-supplied tool descriptors for this turn (validated by the registry).
    pub external_actions: Vec<Value>,
    /// Results for external calls handed out by the previous turn.
    pub tool_results: Vec<Message>,
}

impl TurnInput {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            ..Default::default()
        }
    }

    /// Turn input carrying a user message.
    pub fn user(thread_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(thread_id).with_message(Message::user(content))
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.new_message = Some(message);
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_external_actions(mut self, actions: Vec<Value>) -> Self {
        self.external_actions = actions;
        self
    }

    pub fn with_tool_result(mut self, result: Message) -> Self {
        self.tool_results.push(result);
        self
    }
}

/// Result of a finished turn.
#[derive(Debug, Clone)]
pub struct TurnOutput {
    /// Messages appended by this turn (input included), oldest first.
    pub messages: Vec<Message>,
    /// True when the turn ended with a plain answer; false when calls were handed to the caller.
    pub terminal: bool,
    /// Calls the caller has to execute and answer next turn.
    pub pending_calls: Vec<ToolCall>,
    /// Seq of the checkpoint committed by this turn.
    pub checkpoint_seq: u64,
    /// External actions dropped during validation.
    pub rejected_actions: Vec<ToolDescriptorError>,
}

impl TurnOutput {
    /// Text of the final assistant message, if the turn ended with one.
    pub fn reply(&self) -> Option<&str> {
        match self.messages.last() {
            Some(m @ Message::Assistant { .. }) if !m.content().is_empty() => Some(m.content()),
            _ => None,
        }
    }
}

/// Error type for executor construction and turns.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("compilation failed: {0}")]
    Compilation(#[from] CompilationError),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("execution failed: {0}")]
    Execution(#[from] AgentError),
    #[error("tool source error: {0}")]
    Tools(#[from] ToolSourceError),
}

/// Dashboard agent executor: compiled graph plus checkpoint store.
///
/// Graph: `START -> model`, `model --route--> tools | END`, `tools -> model`. Each turn
/// loads the latest committed checkpoint, merges the input, stages it, runs the graph
/// and commits exactly one new checkpoint when the graph reaches END. A failed turn
/// commits nothing.
///
/// # Example
///
/// ```ignore
/// let executor = AgentExecutor::from_tool_source(llm, tools, checkpointer, AgentOptions::default()).await?;
/// let out = executor.run_turn(TurnInput::user("thread-1", "what's AAPL doing?")).await?;
/// ```
pub struct AgentExecutor {
    graph: CompiledStateGraph<ConversationState>,
    registry: Arc<ToolRegistry>,
    checkpointer: Arc<dyn Checkpointer<ConversationState>>,
    thread_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AgentExecutor {
    /// Builds the executor from explicit collaborators.
    ///
    /// `registry` describes the local tools that `tools` executes.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Arc<dyn ToolSource>,
        registry: ToolRegistry,
        checkpointer: Arc<dyn Checkpointer<ConversationState>>,
        options: AgentOptions,
    ) -> Result<Self, CompilationError> {
        let registry = Arc::new(registry);
        let model = ModelNode::new(llm, registry.clone()).with_timeout(options.model_timeout);
        let tool_node = ToolNode::new(tools, registry.clone());

        let mut graph = StateGraph::<ConversationState>::new();
        graph
            .add_node(MODEL_NODE, Arc::new(model))
            .add_node(TOOLS_NODE, Arc::new(tool_node))
            .add_edge(START, MODEL_NODE)
            .add_conditional_edges(MODEL_NODE, AgentRouter::new(registry.clone()).into_conditional())
            .add_edge(TOOLS_NODE, MODEL_NODE)
            .with_recursion_limit(options.recursion_limit);

        let graph = if options.node_logging {
            graph.compile_with_checkpointer_and_middleware(
                checkpointer.clone(),
                Arc::new(LoggingNodeMiddleware::<ConversationState>::new()),
            )?
        } else {
            graph.compile_with_checkpointer(checkpointer.clone())?
        };

        Ok(Self {
            graph,
            registry,
            checkpointer,
            thread_locks: DashMap::new(),
        })
    }

    /// Builds the executor with a registry listed from `tools`.
    pub async fn from_tool_source(
        llm: Arc<dyn LlmClient>,
        tools: Arc<dyn ToolSource>,
        checkpointer: Arc<dyn Checkpointer<ConversationState>>,
        options: AgentOptions,
    ) -> Result<Self, RunError> {
        let registry = ToolRegistry::from_source(tools.as_ref()).await?;
        Ok(Self::new(llm, tools, registry, checkpointer, options)?)
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Runs one turn to completion.
    pub async fn run_turn(&self, input: TurnInput) -> Result<TurnOutput, RunError> {
        let config = RunnableConfig::for_thread(input.thread_id.clone());
        let ctx = RunContext::new(config);
        self.execute(input, ctx).await
    }

    /// Runs one turn, sending a `StreamEvent` per finished node to `tx` for the enabled modes.
    pub async fn stream_turn(
        &self,
        input: TurnInput,
        modes: impl Into<HashSet<StreamMode>>,
        tx: mpsc::Sender<StreamEvent<ConversationState>>,
    ) -> Result<TurnOutput, RunError> {
        let config = RunnableConfig::for_thread(input.thread_id.clone());
        let ctx = RunContext::new(config).with_stream(tx, modes);
        self.execute(input, ctx).await
    }

    /// Latest committed state of the thread.
    pub async fn state(&self, thread_id: &str) -> Result<Option<ConversationState>, RunError> {
        let config = RunnableConfig::for_thread(thread_id);
        Ok(self.checkpointer.get_tuple(&config).await?.map(|c| c.state))
    }

    /// Committed state of the thread at `seq`.
    pub async fn state_at(&self, thread_id: &str, seq: u64) -> Result<ConversationState, RunError> {
        let config = RunnableConfig::for_thread(thread_id).at_seq(seq);
        self.checkpointer
            .get_tuple(&config)
            .await?
            .map(|c| c.state)
            .ok_or_else(|| RunError::Checkpoint(CheckpointError::NotFound(format!("{}@{}", thread_id, seq))))
    }

    /// Committed checkpoints of the thread, oldest first (newest `limit` kept).
    pub async fn history(
        &self,
        thread_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, RunError> {
        let config = RunnableConfig::for_thread(thread_id);
        Ok(self.checkpointer.list(&config, limit).await?)
    }

    fn thread_lock(&self, thread_id: &str) -> Arc<Mutex<()>> {
        self.thread_locks
            .entry(thread_id.to_string())
            .or_default()
            .clone()
    }

    /// Drops the thread's lock entry unless another turn holds or waits on it.
    ///
    /// Counts the map's copy plus the caller's; `remove_if` runs under the shard lock,
    /// so no turn can clone the entry between the check and the removal.
    fn release_thread_lock(&self, thread_id: &str, lock: Arc<Mutex<()>>) {
        self.thread_locks
            .remove_if(thread_id, |_, held| Arc::ptr_eq(held, &lock) && Arc::strong_count(held) == 2);
    }

    async fn execute(
        &self,
        input: TurnInput,
        ctx: RunContext<ConversationState>,
    ) -> Result<TurnOutput, RunError> {
        let thread_id = ctx.config.require_thread_id()?.to_string();
        let lock = self.thread_lock(&thread_id);
        let guard = lock.lock().await;

        info!(thread_id = %thread_id, "turn started");
        let result = self.execute_locked(input, &ctx).await;
        drop(guard);
        self.release_thread_lock(&thread_id, lock);
        match &result {
            Ok(out) => info!(
                thread_id = %thread_id,
                checkpoint_seq = out.checkpoint_seq,
                terminal = out.terminal,
                "turn committed"
            ),
            Err(e) => error!(thread_id = %thread_id, error = %e, "turn failed"),
        }
        result
    }

    async fn execute_locked(
        &self,
        input: TurnInput,
        ctx: &RunContext<ConversationState>,
    ) -> Result<TurnOutput, RunError> {
        let config = &ctx.config;

        if self.checkpointer.discard_pending(config).await? {
            warn!(thread_id = ?config.thread_id, "discarded step snapshot of an interrupted turn");
        }
        let prior = self
            .checkpointer
            .get_tuple(config)
            .await?
            .map(|c| c.state)
            .unwrap_or_default();
        let prior_len = prior.messages.len();

        let resolution = self.registry.resolve(&input.external_actions);
        let state = merge_input(&prior, input, resolution.external)?;

        self.checkpointer
            .put_step(
                config,
                &state,
                CheckpointMetadata::new(CheckpointSource::Input, 0, None),
            )
            .await?;

        let outcome = self.graph.run(state, ctx).await?;
        let checkpoint_seq = outcome.checkpoint_seq.ok_or_else(|| {
            AgentError::ExecutionFailed("run finished without committing a checkpoint".into())
        })?;

        let pending_calls = pending_tool_calls(&outcome.state.messages);
        Ok(TurnOutput {
            messages: outcome.state.messages[prior_len..].to_vec(),
            terminal: pending_calls.is_empty(),
            pending_calls,
            checkpoint_seq,
            rejected_actions: resolution.rejected,
        })
    }
}

/// Folds the turn input into the prior state.
///
/// Tool results come first so they answer the calls left pending by the previous turn.
/// Calls still unanswered after that are closed with error results, then the user
/// message, language and external actions are applied.
fn merge_input(
    prior: &ConversationState,
    input: TurnInput,
    external: Vec<ToolDescriptor>,
) -> Result<ConversationState, AgentError> {
    let mut results = input.tool_results;
    let mut user = None;
    match input.new_message {
        Some(m @ Message::Tool { .. }) => results.push(m),
        Some(m @ Message::User { .. }) => user = Some(m),
        Some(Message::Assistant { .. }) => {
            return Err(AgentError::SchemaViolation(
                "turn input must be a user or tool message, got an assistant message".into(),
            ))
        }
        None => {}
    }

    let answered = prior.apply(StateUpdate::messages(results))?;

    let mut closing: Vec<Message> = pending_tool_calls(&answered.messages)
        .into_iter()
        .map(|call| {
            warn!(tool = %call.name, call_id = %call.id, "closing tool call left without a result");
            Message::tool_error(call.id, call.name, UNANSWERED_CALL)
        })
        .collect();
    closing.extend(user);

    let mut update = StateUpdate::messages(closing).with_external_actions(external);
    if let Some(language) = input.language {
        update = update.with_language(language);
    }
    answered.apply(update)
}
