//! Middleware that logs node enter/exit through `tracing`.

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::AgentError;

use super::logging::{log_node_complete, log_node_error, log_node_start};
use super::node_middleware::{NodeMiddleware, NodeRunFn};
use super::Next;

/// Logs node enter/exit around each node run.
pub struct LoggingNodeMiddleware<S> {
    _state: PhantomData<fn(S)>,
}

impl<S> LoggingNodeMiddleware<S> {
    pub fn new() -> Self {
        Self {
            _state: PhantomData,
        }
    }
}

impl<S> Default for LoggingNodeMiddleware<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> NodeMiddleware<S> for LoggingNodeMiddleware<S>
where
    S: Send + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeRunFn<S>,
    ) -> Result<(S, Next), AgentError> {
        log_node_start(node_id);
        let result = inner(state).await;
        match &result {
            Ok((_, next)) => log_node_complete(node_id, next),
            Err(e) => log_node_error(node_id, e),
        }
        result
    }
}
