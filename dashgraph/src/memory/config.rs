//! Invoke config: thread_id and optional checkpoint_seq.
//!
//! Used by `CompiledStateGraph::invoke` and `Checkpointer`.

use crate::memory::checkpointer::CheckpointError;

/// Config for a single invoke. Identifies the thread and optional checkpoint.
///
/// When using a checkpointer, invoke must provide at least `thread_id`.
///
/// **Interaction**: Passed to `CompiledStateGraph::invoke(state, config)` and
/// `Checkpointer::put_step` / `commit` / `get_tuple` / `list`.
#[derive(Debug, Clone, Default)]
pub struct RunnableConfig {
    /// Unique id for this conversation/thread. Required when using a checkpointer.
    pub thread_id: Option<String>,
    /// If set, load this committed checkpoint instead of the latest (replay / audit).
    pub checkpoint_seq: Option<u64>,
}

impl RunnableConfig {
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            checkpoint_seq: None,
        }
    }

    pub fn at_seq(mut self, seq: u64) -> Self {
        self.checkpoint_seq = Some(seq);
        self
    }

    /// The thread id, or `CheckpointError::ThreadIdRequired`.
    pub fn require_thread_id(&self) -> Result<&str, CheckpointError> {
        self.thread_id
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(CheckpointError::ThreadIdRequired)
    }
}
