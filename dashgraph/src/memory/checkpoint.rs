//! Checkpoint and metadata types.
//!
//! A committed [`Checkpoint`] is one entry of a thread's ordered log; a [`StagedStep`]
//! is the in-flight snapshot of the running turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a single snapshot (source, step, created_at).
///
/// `step` counts graph steps within the turn that produced the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    pub step: u64,
    /// Node that produced the snapshot; `None` for the merged turn input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CheckpointMetadata {
    pub fn new(source: CheckpointSource, step: u64, node: Option<&str>) -> Self {
        Self {
            source,
            step,
            node: node.map(ToString::to_string),
            created_at: Utc::now(),
        }
    }
}

/// Source of the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointSource {
    /// Caller input merged into the prior state, before any node ran.
    Input,
    /// Produced by a node step inside the graph loop.
    Loop,
}

/// One committed checkpoint: the state at the end of a turn.
///
/// `seq` is strictly increasing per thread, starting at 1.
#[derive(Debug, Clone)]
pub struct Checkpoint<S> {
    pub seq: u64,
    pub state: S,
    pub metadata: CheckpointMetadata,
}

/// Snapshot staged after a step of the running turn. Not visible to resume.
#[derive(Debug, Clone)]
pub struct StagedStep<S> {
    pub state: S,
    pub metadata: CheckpointMetadata,
}

/// Item returned by `Checkpointer::list` for history / audit.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointListItem {
    pub seq: u64,
    pub metadata: CheckpointMetadata,
}

impl<S> Checkpoint<S> {
    pub fn list_item(&self) -> CheckpointListItem {
        CheckpointListItem {
            seq: self.seq,
            metadata: self.metadata.clone(),
        }
    }
}
