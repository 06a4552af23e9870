use async_trait::async_trait;
use serde_json::Value;

use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};

/// A single locally executable tool.
///
/// Registered into an [`AggregateToolSource`](super::AggregateToolSource) by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name (also `spec().name`).
    fn name(&self) -> &str;

    /// Schema exposed to the model.
    fn spec(&self) -> ToolSpec;

    /// Executes the tool with JSON arguments.
    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError>;
}
