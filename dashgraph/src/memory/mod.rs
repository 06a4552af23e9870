//! # Memory: conversation checkpointing
//!
//! Per-thread state snapshots for resumable conversations and audit. A thread's
//! history is an ordered log of committed [`Checkpoint`]s (`seq` 1, 2, ...). While a
//! turn runs, each step is staged with [`Checkpointer::put_step`]; staged steps are
//! never read by resume. [`Checkpointer::commit`] appends the next checkpoint and
//! clears the staged step atomically, so a turn that fails midway leaves the latest
//! committed checkpoint untouched.
//!
//! ## Config
//!
//! [`RunnableConfig`] identifies the thread (`thread_id`, required) and optionally a
//! `checkpoint_seq` to load instead of the latest (replay/audit).
//!
//! ## Checkpointer Implementations
//!
//! | Type             | Persistence | Use case                | Feature  |
//! |------------------|-------------|-------------------------|----------|
//! | [`MemorySaver`]  | In-memory   | Dev, tests              | -        |
//! | [`SqliteSaver`]  | SQLite file | Single-node, production | `sqlite` |
//!
//! [`JsonSerializer`] is used by `SqliteSaver` (state must be `Serialize + DeserializeOwned`).

mod checkpoint;
mod checkpointer;
mod config;
mod memory_saver;
mod serializer;

#[cfg(feature = "sqlite")]
mod sqlite_saver;

pub use checkpoint::{
    Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource, StagedStep,
};
pub use checkpointer::{CheckpointError, Checkpointer};
pub use config::RunnableConfig;
pub use memory_saver::MemorySaver;
pub use serializer::{JsonSerializer, Serializer};

#[cfg(feature = "sqlite")]
pub use sqlite_saver::SqliteSaver;
