//! ToolSource backed by a set of registered [`Tool`]s.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::Tool;
use crate::tool_source::{ToolCallContent, ToolSource, ToolSourceError, ToolSpec};

/// Tool source that dispatches to registered tools by name.
///
/// Keeps registration order for `list_tools`. Registering a name twice replaces the
/// earlier tool in place.
#[derive(Default, Clone)]
pub struct AggregateToolSource {
    tools: Vec<Arc<dyn Tool>>,
}

impl AggregateToolSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool (builder style).
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        if let Some(slot) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            *slot = tool;
        } else {
            self.tools.push(tool);
        }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[async_trait]
impl ToolSource for AggregateToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(self.tools.iter().map(|t| t.spec()).collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ToolSourceError::NotFound(name.to_string()))?;
        tool.call(arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo(&'static str);

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            self.0
        }

        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: self.0.to_string(),
                description: None,
                input_schema: json!({ "type": "object" }),
            }
        }

        async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
            Ok(ToolCallContent {
                text: format!("{}:{}", self.0, args),
            })
        }
    }

    /// **Scenario**: Tools are listed in registration order and dispatched by name.
    #[tokio::test]
    async fn lists_in_order_and_dispatches() {
        let source = AggregateToolSource::new()
            .with_tool(Arc::new(Echo("b")))
            .with_tool(Arc::new(Echo("a")));
        let names: Vec<_> = source
            .list_tools()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["b", "a"]);
        let out = source.call_tool("a", json!({"x": 1})).await.unwrap();
        assert_eq!(out.text, "a:{\"x\":1}");
    }

    /// **Scenario**: Unknown tool name is NotFound; re-registering keeps one entry.
    #[tokio::test]
    async fn unknown_name_and_reregistration() {
        let mut source = AggregateToolSource::new();
        source.register(Arc::new(Echo("a")));
        source.register(Arc::new(Echo("a")));
        assert_eq!(source.len(), 1);
        assert!(matches!(
            source.call_tool("zzz", json!({})).await,
            Err(ToolSourceError::NotFound(_))
        ));
    }
}
