//! Configuration for a CLI turn: endpoint, market data, persistence.
//!
//! Re-exports [`RunConfig`], [`EndpointConfig`], [`RunOptions`] and config [`Error`].

mod run_config;
mod run_options;

pub use run_config::{EndpointConfig, Error, RunConfig};
pub use run_options::RunOptions;
