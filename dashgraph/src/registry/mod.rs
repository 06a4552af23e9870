//! Tool registry: unifies compiled-in tools with caller-supplied tool descriptors.
//!
//! The registry holds the static (local) tools for the lifetime of an executor.
//! Every turn, [`ToolRegistry::resolve`] validates the caller's descriptors and produces
//! a [`UnifiedToolSet`] with unique names: an external tool shadows a local tool of the
//! same name, and among external tools the first occurrence of a name wins.

mod descriptor;

use serde_json::Value;
use tracing::warn;

use crate::tool_source::{ToolSource, ToolSourceError, ToolSpec};

pub use descriptor::{ToolDescriptor, ToolDescriptorError, ToolOwnership};

/// The tools presented to the model for one turn.
///
/// Names are unique. Order: surviving local tools in registration order, then
/// external tools in the caller's order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifiedToolSet {
    tools: Vec<ToolDescriptor>,
}

impl UnifiedToolSet {
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// True when `name` resolves to an externally owned tool.
    pub fn is_external(&self, name: &str) -> bool {
        self.get(name).is_some_and(ToolDescriptor::is_external)
    }

    /// True when `name` resolves to a locally executable tool.
    pub fn is_local(&self, name: &str) -> bool {
        self.get(name).is_some_and(|t| !t.is_external())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    /// Schemas for the model adapter.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(ToolDescriptor::to_spec).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Result of resolving one turn's external actions.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub tools: UnifiedToolSet,
    /// Accepted external descriptors (what the state carries for the turn).
    pub external: Vec<ToolDescriptor>,
    /// Descriptors that were dropped, with the reason.
    pub rejected: Vec<ToolDescriptorError>,
}

/// Static tool catalogue plus per-turn unification with external tools.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    local: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Registry over the given local tool specs. Duplicate local names keep the first.
    pub fn new(local: Vec<ToolSpec>) -> Self {
        let mut registry = Self::default();
        for spec in local {
            if registry.local.iter().any(|t| t.name == spec.name) {
                warn!(tool = %spec.name, "duplicate local tool ignored");
                continue;
            }
            registry.local.push(ToolDescriptor::local(spec));
        }
        registry
    }

    /// Registry over the tools listed by `source`.
    pub async fn from_source(source: &dyn ToolSource) -> Result<Self, ToolSourceError> {
        Ok(Self::new(source.list_tools().await?))
    }

    pub fn local_tools(&self) -> &[ToolDescriptor] {
        &self.local
    }

    /// Validates caller-supplied actions and unifies them with the local tools.
    ///
    /// Malformed descriptors are dropped and logged; they never fail the turn.
    pub fn resolve(&self, external_actions: &[Value]) -> Resolution {
        let mut external: Vec<ToolDescriptor> = Vec::with_capacity(external_actions.len());
        let mut rejected = Vec::new();

        for (index, raw) in external_actions.iter().enumerate() {
            let result = ToolDescriptor::from_external(index, raw).and_then(|d| {
                if external.iter().any(|e| e.name == d.name) {
                    Err(ToolDescriptorError::Duplicate { name: d.name })
                } else {
                    Ok(d)
                }
            });
            match result {
                Ok(d) => external.push(d),
                Err(e) => {
                    warn!(error = %e, "dropping external tool descriptor");
                    rejected.push(e);
                }
            }
        }

        Resolution {
            tools: self.unify(&external),
            external,
            rejected,
        }
    }

    /// Unifies already validated external descriptors with the local tools.
    pub fn unify(&self, external: &[ToolDescriptor]) -> UnifiedToolSet {
        let mut tools: Vec<ToolDescriptor> = self
            .local
            .iter()
            .filter(|l| !external.iter().any(|e| e.name == l.name))
            .cloned()
            .collect();
        for e in external {
            if !tools.iter().any(|t| t.name == e.name) {
                tools.push(e.clone());
            }
        }
        UnifiedToolSet { tools }
    }
}
