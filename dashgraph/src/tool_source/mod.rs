//! Tool source abstraction: list locally executable tools and call them by name.
//!
//! The tool execution node dispatches through a [`ToolSource`]; the model adapter gets
//! the schemas via [`ToolSource::list_tools`] (merged with external tools by the
//! [`ToolRegistry`](crate::registry::ToolRegistry)).

mod mock;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use mock::MockToolSource;

/// Tool schema exposed to the model: name, description and JSON schema for arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Text result of a tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallContent {
    pub text: String,
}

/// Failure of an individual tool call.
///
/// Never aborts a turn: the tool execution node turns it into an error tool-result
/// message so the model can recover or report it.
#[derive(Debug, Error)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("tool failed: {0}")]
    Failed(String),
}

/// Source of locally executable tools.
#[async_trait]
pub trait ToolSource: Send + Sync {
    /// Tools this source can execute.
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError>;

    /// Executes tool `name` with JSON `arguments`.
    async fn call_tool(&self, name: &str, arguments: Value)
        -> Result<ToolCallContent, ToolSourceError>;
}
