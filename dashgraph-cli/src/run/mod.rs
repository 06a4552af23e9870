//! Run entry points: one turn with config from env, with overrides, or with an explicit config.
//!
//! Re-exports [`run`], [`run_with_options`], [`run_with_config`], [`run_turn`] and the
//! turn argument helpers.

pub use crate::config::Error;

mod output;
mod run_with_config;
mod turn_args;

pub use output::render_output;
pub use run_with_config::{build_executor, run_turn, run_with_config};
pub use turn_args::{build_turn_input, load_actions, parse_tool_result, TurnArgs};

use dashgraph::TurnOutput;

use crate::config::{RunConfig, RunOptions};

/// Run one turn with config from env (and .env).
pub async fn run(args: &TurnArgs) -> Result<TurnOutput, Error> {
    run_with_options(args, &RunOptions::default()).await
}

/// Run one turn with config from env and the given overrides.
///
/// Loads `.env`, builds `RunConfig` from env, applies `options`, then runs the turn.
pub async fn run_with_options(args: &TurnArgs, options: &RunOptions) -> Result<TurnOutput, Error> {
    dotenv::dotenv().ok();
    let mut config = RunConfig::from_env()?;
    config.apply_options(options);
    run_with_config(&config, args).await
}
