//! Unit tests for dashgraph-cli, organized by module.
//!
//! Tests are BDD-style with clear Given/When/Then comments and descriptive names.
//! Each submodule documents the behaviour under test.

mod turn_args;

use std::collections::HashMap;

use crate::config::RunConfig;

/// Config from a fixed variable map; no process environment involved.
pub(crate) fn config_from(vars: &[(&str, &str)]) -> RunConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    RunConfig::from_lookup(|key| vars.get(key).cloned()).expect("config")
}
