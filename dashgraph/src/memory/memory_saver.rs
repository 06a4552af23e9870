//! In-memory checkpointer (MemorySaver).

use async_trait::async_trait;
use dashmap::DashMap;

use crate::memory::checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, StagedStep};
use crate::memory::checkpointer::{tail_limit, CheckpointError, Checkpointer};
use crate::memory::config::RunnableConfig;

struct ThreadLog<S> {
    checkpoints: Vec<Checkpoint<S>>,
    pending: Option<StagedStep<S>>,
}

impl<S> Default for ThreadLog<S> {
    fn default() -> Self {
        Self {
            checkpoints: Vec::new(),
            pending: None,
        }
    }
}

/// In-memory checkpointer. Not persistent; for dev and tests.
///
/// Keyed by thread id in a `DashMap`, so distinct threads never contend on one lock.
///
/// **Interaction**: Implements `Checkpointer<S>`; used by `CompiledStateGraph` and
/// `AgentExecutor`.
pub struct MemorySaver<S> {
    threads: DashMap<String, ThreadLog<S>>,
}

impl<S> MemorySaver<S> {
    pub fn new() -> Self {
        Self {
            threads: DashMap::new(),
        }
    }
}

impl<S> Default for MemorySaver<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> Checkpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put_step(
        &self,
        config: &RunnableConfig,
        state: &S,
        metadata: CheckpointMetadata,
    ) -> Result<(), CheckpointError> {
        let thread_id = config.require_thread_id()?;
        self.threads.entry(thread_id.to_string()).or_default().pending = Some(StagedStep {
            state: state.clone(),
            metadata,
        });
        Ok(())
    }

    async fn commit(
        &self,
        config: &RunnableConfig,
        state: &S,
        metadata: CheckpointMetadata,
    ) -> Result<u64, CheckpointError> {
        let thread_id = config.require_thread_id()?;
        let mut log = self.threads.entry(thread_id.to_string()).or_default();
        let seq = log.checkpoints.last().map(|c| c.seq + 1).unwrap_or(1);
        log.checkpoints.push(Checkpoint {
            seq,
            state: state.clone(),
            metadata,
        });
        log.pending = None;
        Ok(seq)
    }

    async fn discard_pending(&self, config: &RunnableConfig) -> Result<bool, CheckpointError> {
        let thread_id = config.require_thread_id()?;
        Ok(self
            .threads
            .get_mut(thread_id)
            .and_then(|mut log| log.pending.take())
            .is_some())
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<Checkpoint<S>>, CheckpointError> {
        let thread_id = config.require_thread_id()?;
        let Some(log) = self.threads.get(thread_id) else {
            return match config.checkpoint_seq {
                Some(seq) => Err(CheckpointError::NotFound(format!("{}@{}", thread_id, seq))),
                None => Ok(None),
            };
        };
        match config.checkpoint_seq {
            Some(seq) => log
                .checkpoints
                .iter()
                .find(|c| c.seq == seq)
                .cloned()
                .map(Some)
                .ok_or_else(|| CheckpointError::NotFound(format!("{}@{}", thread_id, seq))),
            None => Ok(log.checkpoints.last().cloned()),
        }
    }

    async fn get_pending(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<StagedStep<S>>, CheckpointError> {
        let thread_id = config.require_thread_id()?;
        Ok(self
            .threads
            .get(thread_id)
            .and_then(|log| log.pending.clone()))
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let thread_id = config.require_thread_id()?;
        let items = self
            .threads
            .get(thread_id)
            .map(|log| log.checkpoints.iter().map(Checkpoint::list_item).collect())
            .unwrap_or_default();
        Ok(tail_limit(items, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::CheckpointSource;

    fn meta(step: u64) -> CheckpointMetadata {
        CheckpointMetadata::new(CheckpointSource::Loop, step, Some("model"))
    }

    /// **Scenario**: Commits get seq 1, 2, ... and get_tuple returns the latest.
    #[tokio::test]
    async fn commit_appends_with_increasing_seq() {
        let saver = MemorySaver::<Vec<String>>::new();
        let config = RunnableConfig::for_thread("t1");
        assert!(saver.get_tuple(&config).await.unwrap().is_none());

        assert_eq!(saver.commit(&config, &vec!["a".into()], meta(1)).await.unwrap(), 1);
        assert_eq!(
            saver.commit(&config, &vec!["a".into(), "b".into()], meta(3)).await.unwrap(),
            2
        );

        let latest = saver.get_tuple(&config).await.unwrap().unwrap();
        assert_eq!(latest.seq, 2);
        assert_eq!(latest.state.len(), 2);

        let first = saver.get_tuple(&config.clone().at_seq(1)).await.unwrap().unwrap();
        assert_eq!(first.state, vec!["a".to_string()]);
        assert!(matches!(
            saver.get_tuple(&config.clone().at_seq(9)).await,
            Err(CheckpointError::NotFound(_))
        ));
    }

    /// **Scenario**: Staged steps are invisible to get_tuple and cleared by commit.
    #[tokio::test]
    async fn staged_step_invisible_until_commit() {
        let saver = MemorySaver::<u32>::new();
        let config = RunnableConfig::for_thread("t1");
        saver.commit(&config, &1, meta(1)).await.unwrap();

        saver.put_step(&config, &2, meta(1)).await.unwrap();
        saver.put_step(&config, &3, meta(2)).await.unwrap();
        assert_eq!(saver.get_tuple(&config).await.unwrap().unwrap().state, 1);
        assert_eq!(saver.get_pending(&config).await.unwrap().unwrap().state, 3);

        saver.commit(&config, &3, meta(2)).await.unwrap();
        assert!(saver.get_pending(&config).await.unwrap().is_none());
        assert_eq!(saver.get_tuple(&config).await.unwrap().unwrap().state, 3);
    }

    /// **Scenario**: discard_pending drops the staged step and leaves commits alone.
    #[tokio::test]
    async fn discard_pending_keeps_committed() {
        let saver = MemorySaver::<u32>::new();
        let config = RunnableConfig::for_thread("t1");
        saver.commit(&config, &1, meta(1)).await.unwrap();
        saver.put_step(&config, &2, meta(1)).await.unwrap();
        assert!(saver.discard_pending(&config).await.unwrap());
        assert!(!saver.discard_pending(&config).await.unwrap());
        assert_eq!(saver.get_tuple(&config).await.unwrap().unwrap().seq, 1);
    }

    /// **Scenario**: Threads are isolated; list is ascending and respects the limit.
    #[tokio::test]
    async fn threads_isolated_and_list_limited() {
        let saver = MemorySaver::<u32>::new();
        let a = RunnableConfig::for_thread("a");
        let b = RunnableConfig::for_thread("b");
        for i in 0..3 {
            saver.commit(&a, &i, meta(1)).await.unwrap();
        }
        saver.commit(&b, &10, meta(1)).await.unwrap();

        let seqs: Vec<u64> = saver.list(&a, None).await.unwrap().iter().map(|i| i.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        let seqs: Vec<u64> = saver.list(&a, Some(2)).await.unwrap().iter().map(|i| i.seq).collect();
        assert_eq!(seqs, vec![2, 3]);
        assert_eq!(saver.get_tuple(&b).await.unwrap().unwrap().state, 10);
    }

    /// **Scenario**: Missing thread_id is rejected.
    #[tokio::test]
    async fn missing_thread_id_rejected() {
        let saver = MemorySaver::<u32>::new();
        assert!(matches!(
            saver.commit(&RunnableConfig::default(), &1, meta(0)).await,
            Err(CheckpointError::ThreadIdRequired)
        ));
    }
}
