//! In-memory checkpoint storage for development and testing
//!
//! [`MemoryCheckpointStore`] is the reference implementation of
//! [`CheckpointStore`]: a thread-safe map from thread id to an append-only
//! vector of checkpoints. All data is lost on process exit, which makes it
//! the right backend for tests, prototypes, and short-lived workflows - and
//! the wrong one for anything that must survive a restart (use
//! [`FileCheckpointStore`](crate::file::FileCheckpointStore) or a custom
//! backend for that).
//!
//! # Examples
//!
//! ```rust
//! use weft_checkpoint::{Checkpoint, CheckpointStore, MemoryCheckpointStore, RunStatus};
//! use serde_json::json;
//! use std::collections::BTreeSet;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryCheckpointStore::new();
//!
//!     store
//!         .put(Checkpoint::new(
//!             "thread-1",
//!             0,
//!             json!({"log": []}),
//!             BTreeSet::from(["ingest".to_string()]),
//!             RunStatus::Running,
//!         ))
//!         .await?;
//!
//!     let latest = store.get_latest("thread-1").await?.unwrap();
//!     assert_eq!(latest.step, 0);
//!     Ok(())
//! }
//! ```

use crate::{
    checkpoint::Checkpoint,
    error::{CheckpointError, Result},
    traits::{CheckpointStore, CheckpointStream},
};
use async_trait::async_trait;
use futures::stream;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory checkpoint storage
///
/// Clones share the same underlying storage, so a store can be handed to the
/// engine and kept around for inspection in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    storage: Arc<RwLock<HashMap<String, Vec<Checkpoint>>>>,
}

impl MemoryCheckpointStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of threads currently tracked
    pub async fn thread_count(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Total number of checkpoints across all threads
    pub async fn checkpoint_count(&self) -> usize {
        self.storage
            .read()
            .await
            .values()
            .map(|entries| entries.len())
            .sum()
    }

    /// Remove all checkpoints (useful between tests)
    pub async fn clear(&self) {
        self.storage.write().await.clear();
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn put(&self, checkpoint: Checkpoint) -> Result<()> {
        let mut storage = self.storage.write().await;
        let entries = storage
            .entry(checkpoint.thread_id.clone())
            .or_insert_with(Vec::new);

        // Appends are strictly increasing, so the last entry carries the
        // highest step seen so far.
        if let Some(last) = entries.last() {
            if last.step == checkpoint.step {
                return Err(CheckpointError::DuplicateStep {
                    thread_id: checkpoint.thread_id,
                    step: checkpoint.step,
                });
            }
            if last.step > checkpoint.step {
                return Err(CheckpointError::NonMonotonicStep {
                    thread_id: checkpoint.thread_id,
                    step: checkpoint.step,
                    latest: last.step,
                });
            }
        }

        entries.push(checkpoint);
        Ok(())
    }

    async fn get_latest(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let storage = self.storage.read().await;
        Ok(storage
            .get(thread_id)
            .and_then(|entries| entries.last().cloned()))
    }

    async fn history(&self, thread_id: &str) -> Result<CheckpointStream> {
        let storage = self.storage.read().await;
        let entries: Vec<Result<Checkpoint>> = storage
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(Ok)
            .collect();
        Ok(Box::pin(stream::iter(entries)))
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.storage.write().await.remove(thread_id);
        Ok(())
    }
}
