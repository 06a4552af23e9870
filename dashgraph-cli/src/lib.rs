//! dashgraph-cli library: one dashboard-agent turn per call, for the binary and other hosts.
//!
//! Reads endpoint config from env / .env, builds the executor (OpenAI or Azure model,
//! market data tools, SQLite checkpoints) and runs one turn on a thread.
//!
//! ## Usage
//!
//! ```rust,no_run,ignore
//! let args = dashgraph_cli::TurnArgs { message: Some("what's AAPL doing?".into()), ..Default::default() };
//! let out = dashgraph_cli::run(&args).await?;
//! print!("{}", dashgraph_cli::render_output(&out));
//! ```

mod config;
mod logging;
mod run;

pub use config::{EndpointConfig, Error, RunConfig, RunOptions};
pub use dashgraph::{Language, Message, TurnOutput};
pub use logging::{default_filter, init_tracing};
pub use run::{
    build_executor, build_turn_input, load_actions, parse_tool_result, render_output, run,
    run_turn, run_with_config, run_with_options, TurnArgs,
};

#[cfg(test)]
mod tests;
