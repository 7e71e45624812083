//! On-disk append-only checkpoint log
//!
//! [`FileCheckpointStore`] persists each thread's history as a JSON Lines
//! file under a root directory:
//!
//! ```text
//! {root}/
//!   thread-1.jsonl      one serialized checkpoint per line, in step order
//!   thread-2.jsonl
//! ```
//!
//! Writes only ever append, so the file layout mirrors the append-only
//! contract directly and a partially written tail line (crash mid-write) can
//! be detected as a parse failure on the last record. Step monotonicity is
//! enforced through a small in-memory index of the latest step per thread,
//! rebuilt lazily from disk - a fresh process pointed at the same directory
//! resumes exactly where the log ends.
//!
//! Thread ids are used as file names; characters outside `[A-Za-z0-9._-]`
//! are replaced with `_`, so callers that need distinct histories should use
//! filesystem-safe ids.

use crate::{
    checkpoint::Checkpoint,
    error::{CheckpointError, Result},
    serializer::{JsonSerializer, SerializerProtocol},
    traits::{CheckpointStore, CheckpointStream},
};
use async_trait::async_trait;
use futures::stream;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// Durable checkpoint store backed by per-thread append-only log files
pub struct FileCheckpointStore {
    root: PathBuf,
    serializer: JsonSerializer,
    latest: Arc<RwLock<HashMap<String, u64>>>,
}

impl FileCheckpointStore {
    /// Create a store rooted at `root`
    ///
    /// The directory is created on first write; pointing a new store at an
    /// existing directory picks up all previously written histories.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            serializer: JsonSerializer::new(),
            latest: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn thread_path(&self, thread_id: &str) -> PathBuf {
        let safe: String = thread_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{}.jsonl", safe))
    }

    /// Read and decode a thread's full log, oldest first
    async fn read_thread(&self, path: &Path) -> Result<Vec<Checkpoint>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for line in bytes.split(|b| *b == b'\n') {
            if line.is_empty() {
                continue;
            }
            entries.push(self.serializer.loads::<Checkpoint>(line)?);
        }
        Ok(entries)
    }

    /// Latest step recorded for a thread, consulting disk on a cold index
    async fn latest_step(&self, thread_id: &str, path: &Path) -> Result<Option<u64>> {
        if let Some(step) = self.latest.read().await.get(thread_id) {
            return Ok(Some(*step));
        }

        let entries = self.read_thread(path).await?;
        if let Some(last) = entries.last() {
            self.latest
                .write()
                .await
                .insert(thread_id.to_string(), last.step);
            return Ok(Some(last.step));
        }
        Ok(None)
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn put(&self, checkpoint: Checkpoint) -> Result<()> {
        let path = self.thread_path(&checkpoint.thread_id);

        if let Some(latest) = self.latest_step(&checkpoint.thread_id, &path).await? {
            if latest == checkpoint.step {
                return Err(CheckpointError::DuplicateStep {
                    thread_id: checkpoint.thread_id,
                    step: checkpoint.step,
                });
            }
            if latest > checkpoint.step {
                return Err(CheckpointError::NonMonotonicStep {
                    thread_id: checkpoint.thread_id,
                    step: checkpoint.step,
                    latest,
                });
            }
        }

        tokio::fs::create_dir_all(&self.root).await?;

        let mut line = self.serializer.dumps(&checkpoint)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        self.latest
            .write()
            .await
            .insert(checkpoint.thread_id, checkpoint.step);
        Ok(())
    }

    async fn get_latest(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let path = self.thread_path(thread_id);
        Ok(self.read_thread(&path).await?.into_iter().last())
    }

    async fn history(&self, thread_id: &str) -> Result<CheckpointStream> {
        let path = self.thread_path(thread_id);
        let entries: Vec<Result<Checkpoint>> = self
            .read_thread(&path)
            .await?
            .into_iter()
            .map(Ok)
            .collect();
        Ok(Box::pin(stream::iter(entries)))
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let path = self.thread_path(thread_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.latest.write().await.remove(thread_id);
        Ok(())
    }
}
