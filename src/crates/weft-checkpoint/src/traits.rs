//! Extensible checkpoint storage trait for custom backend implementations
//!
//! This module defines [`CheckpointStore`] - the abstraction the execution
//! engine persists through. The engine never assumes a particular backend;
//! anything that can append records, return the latest one, and replay a
//! thread's history in order satisfies the contract (in-memory map, on-disk
//! log, database, remote service).
//!
//! # Contract
//!
//! - **`put`** - append one checkpoint. Histories are append-only and
//!   strictly increasing by step index; implementations must reject a step
//!   that already exists
//!   ([`DuplicateStep`](crate::error::CheckpointError::DuplicateStep)) or
//!   that goes backwards
//!   ([`NonMonotonicStep`](crate::error::CheckpointError::NonMonotonicStep)).
//! - **`get_latest`** - the most recent checkpoint for a thread, or `None`
//!   for an unknown thread.
//! - **`history`** - a lazy, finite stream of a thread's checkpoints ordered
//!   by increasing step. Each call returns a fresh stream, so callers can
//!   restart iteration at will.
//! - **`delete_thread`** - drop a thread's entire history. The engine never
//!   calls this; deletion is an explicit caller decision.
//!
//! # Thread Safety
//!
//! Implementations must be `Send + Sync` and support concurrent appends for
//! distinct thread ids without contention. Serializing appends for a single
//! thread id is the engine's job, not the store's.
//!
//! # Implementing a Custom Backend
//!
//! ```rust,ignore
//! use weft_checkpoint::{Checkpoint, CheckpointStore, CheckpointStream, Result};
//! use async_trait::async_trait;
//!
//! struct PostgresCheckpointStore {
//!     pool: sqlx::PgPool,
//! }
//!
//! #[async_trait]
//! impl CheckpointStore for PostgresCheckpointStore {
//!     async fn put(&self, checkpoint: Checkpoint) -> Result<()> {
//!         // INSERT .. ON CONFLICT (thread_id, step) DO NOTHING, then check
//!         // the affected row count to surface DuplicateStep
//!         todo!()
//!     }
//!
//!     async fn get_latest(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
//!         // SELECT .. WHERE thread_id = $1 ORDER BY step DESC LIMIT 1
//!         todo!()
//!     }
//!
//!     async fn history(&self, thread_id: &str) -> Result<CheckpointStream> {
//!         // Stream rows ordered by step ASC
//!         todo!()
//!     }
//! }
//! ```

use crate::{checkpoint::Checkpoint, error::Result};
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;

/// Lazy, finite stream of checkpoints ordered by increasing step index
pub type CheckpointStream = Pin<Box<dyn Stream<Item = Result<Checkpoint>> + Send + 'static>>;

/// Storage contract for durable checkpoint persistence
///
/// See the [module documentation](self) for the full contract. The engine
/// holds stores as `Arc<dyn CheckpointStore>` so backends can be swapped
/// without touching execution code.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Append a checkpoint to its thread's history
    ///
    /// # Errors
    ///
    /// [`DuplicateStep`](crate::error::CheckpointError::DuplicateStep) if the
    /// step index already exists for the thread;
    /// [`NonMonotonicStep`](crate::error::CheckpointError::NonMonotonicStep)
    /// if it is lower than the latest recorded step.
    async fn put(&self, checkpoint: Checkpoint) -> Result<()>;

    /// Fetch the most recent checkpoint for a thread
    ///
    /// Returns `None` (not an error) for a thread with no history.
    async fn get_latest(&self, thread_id: &str) -> Result<Option<Checkpoint>>;

    /// Stream a thread's full checkpoint history, oldest first
    ///
    /// The stream is finite and each call starts from the beginning. An
    /// unknown thread yields an empty stream.
    async fn history(&self, thread_id: &str) -> Result<CheckpointStream>;

    /// Delete all checkpoints for a thread
    ///
    /// Deleting an unknown thread is a no-op.
    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let _ = thread_id;
        Ok(())
    }
}
