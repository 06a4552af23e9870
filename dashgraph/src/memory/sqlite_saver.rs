//! SQLite-backed checkpointer (SqliteSaver).
//!
//! Two tables: `checkpoints` holds the committed log keyed by `(thread_id, seq)`;
//! `pending_steps` holds at most one staged step per thread. `commit` inserts the next
//! seq and deletes the staged row in one transaction. State is stored through a
//! [`Serializer`] (normally [`JsonSerializer`](crate::memory::JsonSerializer)), metadata as JSON text.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::memory::checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, StagedStep};
use crate::memory::checkpointer::{tail_limit, CheckpointError, Checkpointer};
use crate::memory::config::RunnableConfig;
use crate::memory::serializer::Serializer;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS checkpoints (
    thread_id TEXT NOT NULL,
    seq INTEGER NOT NULL,
    state BLOB NOT NULL,
    metadata TEXT NOT NULL,
    PRIMARY KEY (thread_id, seq)
);

CREATE TABLE IF NOT EXISTS pending_steps (
    thread_id TEXT PRIMARY KEY,
    state BLOB NOT NULL,
    metadata TEXT NOT NULL
);
"#;

fn storage(e: impl std::fmt::Display) -> CheckpointError {
    CheckpointError::Storage(e.to_string())
}

fn encode_metadata(metadata: &CheckpointMetadata) -> Result<String, CheckpointError> {
    serde_json::to_string(metadata).map_err(|e| CheckpointError::Serialization(e.to_string()))
}

fn decode_metadata(text: &str) -> Result<CheckpointMetadata, CheckpointError> {
    serde_json::from_str(text).map_err(|e| CheckpointError::Serialization(e.to_string()))
}

/// Durable checkpointer over a single SQLite file.
///
/// The connection sits behind a mutex and every operation runs on the blocking pool
/// (`tokio::task::spawn_blocking`), so async callers never block the runtime.
///
/// **Interaction**: Implements `Checkpointer<S>`; used by `AgentExecutor` in the CLI.
pub struct SqliteSaver<S> {
    conn: Arc<Mutex<Connection>>,
    serializer: Arc<dyn Serializer<S>>,
}

impl<S> SqliteSaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Opens (or creates) the database at `path` and ensures the schema.
    pub fn new(
        path: impl AsRef<Path>,
        serializer: Arc<dyn Serializer<S>>,
    ) -> Result<Self, CheckpointError> {
        let conn = Connection::open(path).map_err(storage)?;
        Self::with_connection(conn, serializer)
    }

    /// In-memory database; for tests.
    pub fn in_memory(serializer: Arc<dyn Serializer<S>>) -> Result<Self, CheckpointError> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        Self::with_connection(conn, serializer)
    }

    fn with_connection(
        conn: Connection,
        serializer: Arc<dyn Serializer<S>>,
    ) -> Result<Self, CheckpointError> {
        conn.execute_batch(SCHEMA).map_err(storage)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            serializer,
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, CheckpointError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, CheckpointError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| CheckpointError::Storage("connection lock poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(storage)?
    }
}

#[async_trait]
impl<S> Checkpointer<S> for SqliteSaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put_step(
        &self,
        config: &RunnableConfig,
        state: &S,
        metadata: CheckpointMetadata,
    ) -> Result<(), CheckpointError> {
        let thread_id = config.require_thread_id()?.to_string();
        let bytes = self.serializer.serialize(state)?;
        let meta = encode_metadata(&metadata)?;
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO pending_steps (thread_id, state, metadata) VALUES (?1, ?2, ?3)
                 ON CONFLICT(thread_id) DO UPDATE SET state = excluded.state, metadata = excluded.metadata",
                params![thread_id, bytes, meta],
            )
            .map_err(storage)?;
            Ok(())
        })
        .await
    }

    async fn commit(
        &self,
        config: &RunnableConfig,
        state: &S,
        metadata: CheckpointMetadata,
    ) -> Result<u64, CheckpointError> {
        let thread_id = config.require_thread_id()?.to_string();
        let bytes = self.serializer.serialize(state)?;
        let meta = encode_metadata(&metadata)?;
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(storage)?;
            let last: Option<i64> = tx
                .query_row(
                    "SELECT MAX(seq) FROM checkpoints WHERE thread_id = ?1",
                    params![thread_id],
                    |row| row.get(0),
                )
                .map_err(storage)?;
            let seq = last.unwrap_or(0) + 1;
            tx.execute(
                "INSERT INTO checkpoints (thread_id, seq, state, metadata) VALUES (?1, ?2, ?3, ?4)",
                params![thread_id, seq, bytes, meta],
            )
            .map_err(storage)?;
            tx.execute(
                "DELETE FROM pending_steps WHERE thread_id = ?1",
                params![thread_id],
            )
            .map_err(storage)?;
            tx.commit().map_err(storage)?;
            Ok(seq as u64)
        })
        .await
    }

    async fn discard_pending(&self, config: &RunnableConfig) -> Result<bool, CheckpointError> {
        let thread_id = config.require_thread_id()?.to_string();
        self.with_conn(move |conn| {
            let n = conn
                .execute(
                    "DELETE FROM pending_steps WHERE thread_id = ?1",
                    params![thread_id],
                )
                .map_err(storage)?;
            Ok(n > 0)
        })
        .await
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<Checkpoint<S>>, CheckpointError> {
        let thread_id = config.require_thread_id()?.to_string();
        let requested = config.checkpoint_seq;
        let row = self
            .with_conn(move |conn| {
                let row = match requested {
                    Some(seq) => conn
                        .query_row(
                            "SELECT seq, state, metadata FROM checkpoints
                             WHERE thread_id = ?1 AND seq = ?2",
                            params![thread_id, seq as i64],
                            |r| Ok((r.get::<_, i64>(0)?, r.get::<_, Vec<u8>>(1)?, r.get::<_, String>(2)?)),
                        )
                        .optional()
                        .map_err(storage)?,
                    None => conn
                        .query_row(
                            "SELECT seq, state, metadata FROM checkpoints
                             WHERE thread_id = ?1 ORDER BY seq DESC LIMIT 1",
                            params![thread_id],
                            |r| Ok((r.get::<_, i64>(0)?, r.get::<_, Vec<u8>>(1)?, r.get::<_, String>(2)?)),
                        )
                        .optional()
                        .map_err(storage)?,
                };
                match (row, requested) {
                    (None, Some(seq)) => Err(CheckpointError::NotFound(format!(
                        "{}@{}",
                        thread_id, seq
                    ))),
                    (row, _) => Ok(row),
                }
            })
            .await?;

        match row {
            None => Ok(None),
            Some((seq, bytes, meta)) => Ok(Some(Checkpoint {
                seq: seq as u64,
                state: self.serializer.deserialize(&bytes)?,
                metadata: decode_metadata(&meta)?,
            })),
        }
    }

    async fn get_pending(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<StagedStep<S>>, CheckpointError> {
        let thread_id = config.require_thread_id()?.to_string();
        let row = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT state, metadata FROM pending_steps WHERE thread_id = ?1",
                    params![thread_id],
                    |r| Ok((r.get::<_, Vec<u8>>(0)?, r.get::<_, String>(1)?)),
                )
                .optional()
                .map_err(storage)
            })
            .await?;
        match row {
            None => Ok(None),
            Some((bytes, meta)) => Ok(Some(StagedStep {
                state: self.serializer.deserialize(&bytes)?,
                metadata: decode_metadata(&meta)?,
            })),
        }
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let thread_id = config.require_thread_id()?.to_string();
        let rows = self
            .with_conn(move |conn| {
                let mut stmt = conn
                    .prepare("SELECT seq, metadata FROM checkpoints WHERE thread_id = ?1 ORDER BY seq ASC")
                    .map_err(storage)?;
                let rows = stmt
                    .query_map(params![thread_id], |r| {
                        Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?))
                    })
                    .map_err(storage)?
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(storage)?;
                Ok(rows)
            })
            .await?;
        let items = rows
            .into_iter()
            .map(|(seq, meta)| {
                Ok(CheckpointListItem {
                    seq: seq as u64,
                    metadata: decode_metadata(&meta)?,
                })
            })
            .collect::<Result<Vec<_>, CheckpointError>>()?;
        Ok(tail_limit(items, limit))
    }
}
