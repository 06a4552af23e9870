//! Mock ToolSource for tests.
//!
//! Returns fixed tool list and per-tool canned results or failures; no HTTP required.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ToolCallContent, ToolSource, ToolSourceError, ToolSpec};

/// Mock tool source: fixed tool list, canned results, and a call log.
///
/// `call_tool(name, _)` returns the result registered for `name`, or the default
/// result when none is registered. Names registered with [`with_failure`](Self::with_failure)
/// return `ToolSourceError::Failed`. Unlisted names return `NotFound`.
pub struct MockToolSource {
    tools: Vec<ToolSpec>,
    default_result: String,
    results: HashMap<String, String>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockToolSource {
    /// Mock exposing the two market tools with the mock server's canned payloads.
    pub fn market_example() -> Self {
        Self::new(
            vec![
                ToolSpec {
                    name: "getMarketMovers".to_string(),
                    description: Some("Get the current market movers (top gainers/losers)".to_string()),
                    input_schema: json!({ "type": "object", "properties": {} }),
                },
                ToolSpec {
                    name: "getStockHistory".to_string(),
                    description: Some("Get historical stock data for a given ticker symbol".to_string()),
                    input_schema: json!({
                        "type": "object",
                        "properties": { "ticker": { "type": "string" } },
                        "required": ["ticker"]
                    }),
                },
            ],
            "{}".to_string(),
        )
        .with_result(
            "getMarketMovers",
            r#"[{"symbol":"AAPL","change":"+2.4%"},{"symbol":"TSLA","change":"-1.2%"}]"#,
        )
    }

    /// Creates a mock with custom tool list and a default call result.
    pub fn new(tools: Vec<ToolSpec>, default_result: String) -> Self {
        Self {
            tools,
            default_result,
            results: HashMap::new(),
            failures: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sets the text returned for `name` (builder style).
    pub fn with_result(mut self, name: &str, text: &str) -> Self {
        self.results.insert(name.to_string(), text.to_string());
        self
    }

    /// Makes calls to `name` fail with `message`.
    pub fn with_failure(mut self, name: &str, message: &str) -> Self {
        self.failures.insert(name.to_string(), message.to_string());
        self
    }

    /// Calls received so far, in completion order.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for MockToolSource {
    fn default() -> Self {
        Self::market_example()
    }
}

#[async_trait]
impl ToolSource for MockToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallContent, ToolSourceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((name.to_string(), arguments));
        }
        if !self.tools.iter().any(|t| t.name == name) {
            return Err(ToolSourceError::NotFound(name.to_string()));
        }
        if let Some(msg) = self.failures.get(name) {
            return Err(ToolSourceError::Failed(msg.clone()));
        }
        let text = self
            .results
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.default_result.clone());
        Ok(ToolCallContent { text })
    }
}
