//! Optional overrides for a turn (CLI args or programmatic).
//!
//! Used by [`RunConfig::apply_options`](super::RunConfig::apply_options) and
//! [`run_with_options`](crate::run_with_options).

use dashgraph::Language;

/// Optional overrides for a run: temperature, thread, DB path, language, output mode.
///
/// All fields are optional; only set fields override the base config (from env).
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Override sampling temperature (0-2).
    pub temperature: Option<f32>,
    /// Conversation thread to continue.
    pub thread_id: Option<String>,
    /// Override SQLite database path for persistence.
    pub db_path: Option<String>,
    /// Response language for this and later turns.
    pub language: Option<Language>,
    /// Print node progress while the turn runs.
    pub stream: bool,
    /// Debug logs and node logging middleware.
    pub verbose: bool,
}
