//! Checkpointer trait and error type.

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, StagedStep};
use crate::memory::config::RunnableConfig;

/// Error from checkpoint operations.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("thread_id required")]
    ThreadIdRequired,
    #[error("checkpoint not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Saves and loads per-thread conversation snapshots.
///
/// Committed checkpoints form an append-only log per thread. At most one staged step
/// exists per thread; it is replaced by each `put_step` and removed by `commit` or
/// `discard_pending`. Implementations must support concurrent use on distinct threads
/// and give read-your-writes on the same thread.
///
/// **Interaction**: Used by `CompiledStateGraph` when compiled with a checkpointer and
/// by `AgentExecutor` to load the prior state of a thread.
#[async_trait]
pub trait Checkpointer<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    /// Stages the snapshot after a step. Not visible to `get_tuple`.
    async fn put_step(
        &self,
        config: &RunnableConfig,
        state: &S,
        metadata: CheckpointMetadata,
    ) -> Result<(), CheckpointError>;

    /// Appends a checkpoint with the next seq and clears the staged step, atomically.
    /// Returns the new seq.
    async fn commit(
        &self,
        config: &RunnableConfig,
        state: &S,
        metadata: CheckpointMetadata,
    ) -> Result<u64, CheckpointError>;

    /// Drops the staged step of the thread, if any. Returns whether one existed.
    async fn discard_pending(&self, config: &RunnableConfig) -> Result<bool, CheckpointError>;

    /// Latest committed checkpoint, or the one at `config.checkpoint_seq`.
    ///
    /// `Ok(None)` for a thread with no checkpoints. A requested seq that does not
    /// exist is `CheckpointError::NotFound`.
    async fn get_tuple(&self, config: &RunnableConfig)
        -> Result<Option<Checkpoint<S>>, CheckpointError>;

    /// The staged step of the thread, if a turn is in flight or was interrupted.
    async fn get_pending(&self, config: &RunnableConfig)
        -> Result<Option<StagedStep<S>>, CheckpointError>;

    /// Committed checkpoints of the thread in ascending seq order (at most `limit`, newest kept).
    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError>;
}

/// Keeps the newest `limit` items of an ascending list.
pub(crate) fn tail_limit<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(n) = limit {
        if items.len() > n {
            items.drain(..items.len() - n);
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display of each CheckpointError variant contains the expected text.
    #[test]
    fn checkpoint_error_display_all_variants() {
        assert!(CheckpointError::ThreadIdRequired
            .to_string()
            .contains("thread_id"));
        assert!(CheckpointError::NotFound("t1@4".into())
            .to_string()
            .contains("t1@4"));
        assert!(CheckpointError::Storage("io".into())
            .to_string()
            .contains("storage"));
        assert!(CheckpointError::Serialization("bad".into())
            .to_string()
            .contains("serialization"));
    }

    /// **Scenario**: tail_limit keeps the newest entries.
    #[test]
    fn tail_limit_keeps_newest() {
        assert_eq!(tail_limit(vec![1, 2, 3, 4], Some(2)), vec![3, 4]);
        assert_eq!(tail_limit(vec![1, 2], Some(5)), vec![1, 2]);
        assert_eq!(tail_limit(vec![1, 2], None), vec![1, 2]);
    }
}
