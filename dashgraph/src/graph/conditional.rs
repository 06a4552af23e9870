//! Conditional edges: pick the next node from the state after a node runs.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::AgentError;

use super::state_graph::END;
use super::Next;

/// Router function: state in, route key out.
pub type ConditionalRouterFn<S> = Arc<dyn Fn(&S) -> Result<String, AgentError> + Send + Sync>;

/// Conditional outgoing edge of a node.
///
/// The router function returns a key; with a path map the key is translated to a
/// node id (or `END`), otherwise the key is the node id itself. Declared targets are
/// validated at compile time.
#[derive(Clone)]
pub struct ConditionalRouter<S> {
    router: ConditionalRouterFn<S>,
    path_map: Option<HashMap<String, String>>,
}

impl<S> ConditionalRouter<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(
        router: impl Fn(&S) -> Result<String, AgentError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            router: Arc::new(router),
            path_map: None,
        }
    }

    /// Restricts routing to the given `key -> target` pairs.
    pub fn with_path_map<K, V>(mut self, path_map: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.path_map = Some(
            path_map
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Declared targets (path map values); `None` when routing is unrestricted.
    pub fn targets(&self) -> Option<Vec<&str>> {
        self.path_map
            .as_ref()
            .map(|m| m.values().map(String::as_str).collect())
    }

    /// Evaluates the router against `state`.
    ///
    /// A key missing from the path map is an `ExecutionFailed` error.
    pub fn route(&self, state: &S) -> Result<Next, AgentError> {
        let key = (self.router)(state)?;
        let target = match &self.path_map {
            Some(map) => map.get(&key).cloned().ok_or_else(|| {
                AgentError::ExecutionFailed(format!("route key not in path map: {}", key))
            })?,
            None => key,
        };
        Ok(if target == END {
            Next::End
        } else {
            Next::Node(target)
        })
    }
}
