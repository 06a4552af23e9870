//! Node middleware: wraps each node run inside `CompiledStateGraph`.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::AgentError;

use super::Next;

/// The wrapped node run handed to middleware.
pub type NodeRunFn<S> = Box<
    dyn FnOnce(S) -> Pin<Box<dyn Future<Output = Result<(S, Next), AgentError>> + Send>> + Send,
>;

/// Around-advice for node execution.
///
/// Implementations must call `inner` at most once and may inspect or replace its result.
///
/// **Interaction**: Passed to `StateGraph::compile_with_middleware`; see
/// `LoggingNodeMiddleware`.
#[async_trait]
pub trait NodeMiddleware<S>: Send + Sync
where
    S: Send + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeRunFn<S>,
    ) -> Result<(S, Next), AgentError>;
}
