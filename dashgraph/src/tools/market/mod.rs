//! HTTP-backed market data tools: market movers and stock price history.
//!
//! Both tools issue a GET against a market data service (the dashboard's mock server
//! by default) and return the JSON body as text for the model to read.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::Tool;
use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};

/// Tool name: current top gainers/losers.
pub const TOOL_GET_MARKET_MOVERS: &str = "getMarketMovers";
/// Tool name: price history for one ticker.
pub const TOOL_GET_STOCK_HISTORY: &str = "getStockHistory";
/// Base URL of the local market data service.
pub const DEFAULT_MARKET_DATA_URL: &str = "http://localhost:4000";

/// Both market tools sharing one HTTP client and base URL.
pub fn market_tools(client: reqwest::Client, base_url: &str) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(MarketMoversTool::with_client(client.clone(), base_url)),
        Arc::new(StockHistoryTool::with_client(client, base_url)),
    ]
}

async fn get_text(request: reqwest::RequestBuilder) -> Result<ToolCallContent, ToolSourceError> {
    let response = request
        .send()
        .await
        .map_err(|e| ToolSourceError::Transport(format!("request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(ToolSourceError::Transport(format!(
            "request failed with status: {}",
            response.status()
        )));
    }

    let text = response
        .text()
        .await
        .map_err(|e| ToolSourceError::Transport(format!("failed to read response: {}", e)))?;
    Ok(ToolCallContent { text })
}

/// `getMarketMovers`: no arguments, `GET {base}/api/market-movers`.
pub struct MarketMoversTool {
    client: reqwest::Client,
    base_url: String,
}

impl MarketMoversTool {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Tool for MarketMoversTool {
    fn name(&self) -> &str {
        TOOL_GET_MARKET_MOVERS
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_GET_MARKET_MOVERS.to_string(),
            description: Some("Get the current market movers (top gainers/losers)".to_string()),
            input_schema: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
        debug!(args = %args, "getMarketMovers called");
        let url = format!("{}/api/market-movers", self.base_url);
        get_text(self.client.get(url)).await
    }
}

/// `getStockHistory`: `{ "ticker": string }`, `GET {base}/api/stock-history?ticker=`.
pub struct StockHistoryTool {
    client: reqwest::Client,
    base_url: String,
}

impl StockHistoryTool {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Tool for StockHistoryTool {
    fn name(&self) -> &str {
        TOOL_GET_STOCK_HISTORY
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_GET_STOCK_HISTORY.to_string(),
            description: Some("Get historical stock data for a given ticker symbol".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "ticker": {
                        "type": "string",
                        "description": "The ticker symbol to get history for"
                    }
                },
                "required": ["ticker"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
        let ticker = args
            .get("ticker")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ToolSourceError::InvalidInput("missing ticker".to_string()))?;
        debug!(ticker, "getStockHistory called");
        let url = format!("{}/api/stock-history", self.base_url);
        get_text(self.client.get(url).query(&[("ticker", ticker)])).await
    }
}
