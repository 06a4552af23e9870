//! # dashgraph
//!
//! A turn-by-turn, tool-calling conversational agent for a market dashboard, built on a
//! small LangGraph-style state graph with checkpointed conversation state.
//!
//! ## Design Principles
//!
//! - **Single state type**: every node reads and returns [`ConversationState`]; nodes
//!   never mutate it in place, they fold [`StateUpdate`]s through the merge policy.
//! - **Local and external tools**: compiled-in tools run inside the graph; tools supplied
//!   by the caller for a turn are presented to the model but executed by the caller.
//! - **One checkpoint per turn**: each step is staged, and only a turn that reaches END
//!   commits a resumable checkpoint.
//!
//! ## Main Modules
//!
//! - [`graph`]: `StateGraph`, `CompiledStateGraph`, `Node`, `Next`, conditional edges.
//! - [`agent`]: model node, router, tool node and the [`AgentExecutor`] that runs turns.
//! - [`state`]: conversation state schema and merge policy.
//! - [`registry`]: tool descriptors and per-turn unification of local and external tools.
//! - [`llm`]: `LlmClient` trait, `MockLlm`, and `ChatOpenAI` (feature `openai`).
//! - [`memory`]: `Checkpointer` trait, `MemorySaver`, and `SqliteSaver` (feature `sqlite`).
//! - [`tool_source`] / [`tools`]: tool execution seam and the market data tools.
//!
//! ## Features
//!
//! - `sqlite` (default): persistent checkpointer.
//! - `market-data` (default): `getMarketMovers` / `getStockHistory` over HTTP.
//! - `openai`: OpenAI or Azure OpenAI chat completions via `async-openai`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dashgraph::{AgentExecutor, AgentOptions, MemorySaver, MockLlm, MockToolSource, TurnInput};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = Arc::new(MockLlm::with_text("Markets are quiet today."));
//! let tools = Arc::new(MockToolSource::market_example());
//! let checkpointer = Arc::new(MemorySaver::new());
//! let executor =
//!     AgentExecutor::from_tool_source(llm, tools, checkpointer, AgentOptions::default()).await?;
//!
//! let out = executor.run_turn(TurnInput::user("thread-1", "how are markets?")).await?;
//! println!("{:?}", out.reply());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod message;
pub mod registry;
pub mod state;
pub mod stream;
pub mod tool_source;
pub mod tools;

pub use agent::{
    AgentExecutor, AgentOptions, AgentRouter, ModelNode, Route, RunError, ToolNode, TurnInput,
    TurnOutput,
};
pub use error::AgentError;
pub use graph::{
    CompilationError, CompiledStateGraph, ConditionalRouter, GraphOutcome, Next, Node,
    NodeMiddleware, RunContext, StateGraph, END, START,
};
pub use llm::{LlmClient, MockLlm, MockReply, ModelOutput};
#[cfg(feature = "openai")]
pub use llm::ChatOpenAI;
pub use memory::{
    Checkpoint, CheckpointError, CheckpointListItem, CheckpointMetadata, CheckpointSource,
    Checkpointer, JsonSerializer, MemorySaver, RunnableConfig, StagedStep,
};
#[cfg(feature = "sqlite")]
pub use memory::SqliteSaver;
pub use message::{Message, ToolCall};
pub use registry::{ToolDescriptor, ToolDescriptorError, ToolOwnership, ToolRegistry, UnifiedToolSet};
pub use state::{ConversationState, Language, StateUpdate};
pub use stream::{StreamEvent, StreamMode};
pub use tool_source::{MockToolSource, ToolCallContent, ToolSource, ToolSourceError, ToolSpec};
pub use tools::{AggregateToolSource, Tool};
