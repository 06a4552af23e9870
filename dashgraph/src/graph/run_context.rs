//! Run context passed into nodes for streaming-aware execution.
//!
//! Holds runnable config and optional stream sender plus selected stream modes.

use std::collections::HashSet;
use std::fmt::Debug;

use tokio::sync::mpsc;

use crate::memory::RunnableConfig;
use crate::stream::{StreamEvent, StreamMode};

#[derive(Clone)]
pub struct RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Config for the current run (thread_id, checkpoint_seq).
    pub config: RunnableConfig,
    /// Optional sender for streaming events.
    pub stream_tx: Option<mpsc::Sender<StreamEvent<S>>>,
    /// Enabled stream modes (Values, Updates).
    pub stream_mode: HashSet<StreamMode>,
}

impl<S> RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(config: RunnableConfig) -> Self {
        Self {
            config,
            stream_tx: None,
            stream_mode: HashSet::new(),
        }
    }

    pub fn with_stream(
        mut self,
        tx: mpsc::Sender<StreamEvent<S>>,
        modes: impl Into<HashSet<StreamMode>>,
    ) -> Self {
        self.stream_tx = Some(tx);
        self.stream_mode = modes.into();
        self
    }

    /// Sends the events enabled by `stream_mode` for a finished node. Closed receivers are ignored.
    pub(crate) async fn emit(&self, node_id: &str, state: &S) {
        let Some(tx) = &self.stream_tx else {
            return;
        };
        if self.stream_mode.contains(&StreamMode::Values) {
            let _ = tx.send(StreamEvent::Values(state.clone())).await;
        }
        if self.stream_mode.contains(&StreamMode::Updates) {
            let _ = tx
                .send(StreamEvent::Updates {
                    node_id: node_id.to_string(),
                    state: state.clone(),
                })
                .await;
        }
    }
}
