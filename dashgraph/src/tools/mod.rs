//! Locally executable tools and the tool source that aggregates them.
//!
//! Each [`Tool`] owns its spec and its call; [`AggregateToolSource`] exposes a set of
//! tools as one [`ToolSource`](crate::ToolSource) for the tool execution node.

mod aggregate_source;
#[cfg(feature = "market-data")]
mod market;
mod r#trait;

pub use aggregate_source::AggregateToolSource;
pub use r#trait::Tool;

#[cfg(feature = "market-data")]
pub use market::{
    market_tools, MarketMoversTool, StockHistoryTool, DEFAULT_MARKET_DATA_URL,
    TOOL_GET_MARKET_MOVERS, TOOL_GET_STOCK_HISTORY,
};
