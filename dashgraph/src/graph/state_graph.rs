//! State graph: nodes + explicit edges (from → to) + conditional edges.
//!
//! Add nodes with `add_node`, wire them with `add_edge(from, to)` using `START` and
//! `END` for entry/exit, branch with `add_conditional_edges`, then `compile` (or a
//! `compile_with_*` variant) to get a `CompiledStateGraph`. Cycles are allowed; the
//! compiled graph bounds them with a recursion limit.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::sync::Arc;

use crate::graph::compile_error::CompilationError;
use crate::graph::compiled::{CompiledStateGraph, DEFAULT_RECURSION_LIMIT};
use crate::graph::conditional::ConditionalRouter;
use crate::graph::node::Node;
use crate::graph::node_middleware::NodeMiddleware;
use crate::memory::Checkpointer;

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to_id` in `add_edge(last_node_id, END)`.
pub const END: &str = "__end__";

/// State graph: nodes plus explicit and conditional edges.
///
/// Generic over state type `S`. Build with `add_node` / `add_edge` /
/// `add_conditional_edges`, then `compile()` to obtain an executable graph.
///
/// **Interaction**: Accepts `Arc<dyn Node<S>>`; produces `CompiledStateGraph<S>`.
/// Checkpointer and middleware are passed at compile time only.
pub struct StateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: Vec<(String, String)>,
    conditional: Vec<(String, ConditionalRouter<S>)>,
    recursion_limit: usize,
}

impl<S> Default for StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional: Vec::new(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Adds a node; id must be unique. Replaces if same id.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds an edge from `from_id` to `to_id`.
    ///
    /// Use `START` for graph entry and `END` for graph exit.
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), to_id.into()));
        self
    }

    /// Adds a conditional outgoing edge: after `from_id` runs (and returns
    /// `Next::Continue`), `router` picks the next node.
    pub fn add_conditional_edges(
        &mut self,
        from_id: impl Into<String>,
        router: ConditionalRouter<S>,
    ) -> &mut Self {
        self.conditional.push((from_id.into(), router));
        self
    }

    /// Maximum number of node runs per invoke (default 25).
    pub fn with_recursion_limit(&mut self, limit: usize) -> &mut Self {
        self.recursion_limit = limit;
        self
    }

    /// Builds the executable graph after validating the wiring.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(None, None)
    }

    /// Builds the executable graph with a checkpointer: each step is staged and the
    /// final state is committed when the run ends (requires `config.thread_id`).
    pub fn compile_with_checkpointer(
        self,
        checkpointer: Arc<dyn Checkpointer<S>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(Some(checkpointer), None)
    }

    /// Builds the executable graph with node middleware wrapping each node run.
    pub fn compile_with_middleware(
        self,
        middleware: Arc<dyn NodeMiddleware<S>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(None, Some(middleware))
    }

    /// Builds the executable graph with both checkpointer and node middleware.
    pub fn compile_with_checkpointer_and_middleware(
        self,
        checkpointer: Arc<dyn Checkpointer<S>>,
        middleware: Arc<dyn NodeMiddleware<S>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(Some(checkpointer), Some(middleware))
    }

    fn check_node(&self, id: &str) -> Result<(), CompilationError> {
        if self.nodes.contains_key(id) {
            Ok(())
        } else {
            Err(CompilationError::NodeNotFound(id.to_string()))
        }
    }

    fn compile_internal(
        self,
        checkpointer: Option<Arc<dyn Checkpointer<S>>>,
        middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        let mut entry: Option<String> = None;
        let mut edges: HashMap<String, String> = HashMap::new();

        for (from, to) in &self.edges {
            if to != END {
                self.check_node(to)?;
            }
            if from == START {
                if entry.replace(to.clone()).is_some() {
                    return Err(CompilationError::MissingStart);
                }
                continue;
            }
            self.check_node(from)?;
            if edges.insert(from.clone(), to.clone()).is_some() {
                return Err(CompilationError::DuplicateOutgoingEdge(from.clone()));
            }
        }
        let entry = entry.ok_or(CompilationError::MissingStart)?;
        if entry == END {
            return Err(CompilationError::NodeNotFound(END.to_string()));
        }

        let mut conditional: HashMap<String, ConditionalRouter<S>> = HashMap::new();
        for (from, router) in &self.conditional {
            self.check_node(from)?;
            if let Some(targets) = router.targets() {
                for t in targets {
                    if t != END {
                        self.check_node(t)?;
                    }
                }
            }
            if edges.contains_key(from)
                || conditional.insert(from.clone(), router.clone()).is_some()
            {
                return Err(CompilationError::DuplicateOutgoingEdge(from.clone()));
            }
        }

        for id in self.nodes.keys() {
            if !edges.contains_key(id) && !conditional.contains_key(id) {
                return Err(CompilationError::NoOutgoingEdge(id.clone()));
            }
        }

        if !reaches_end(&entry, &edges, &conditional) {
            return Err(CompilationError::MissingEnd);
        }

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            entry,
            edges,
            conditional,
            checkpointer,
            middleware,
            recursion_limit: self.recursion_limit,
        })
    }
}

/// Breadth-first search from the entry; unrestricted conditional edges may reach END.
fn reaches_end<S>(
    entry: &str,
    edges: &HashMap<String, String>,
    conditional: &HashMap<String, ConditionalRouter<S>>,
) -> bool
where
    S: Clone + Send + Sync + Debug + 'static,
{
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([entry.to_string()]);
    while let Some(id) = queue.pop_front() {
        if id == END {
            return true;
        }
        if !seen.insert(id.clone()) {
            continue;
        }
        if let Some(to) = edges.get(&id) {
            queue.push_back(to.clone());
        }
        if let Some(router) = conditional.get(&id) {
            match router.targets() {
                None => return true,
                Some(targets) => queue.extend(targets.into_iter().map(ToString::to_string)),
            }
        }
    }
    false
}
