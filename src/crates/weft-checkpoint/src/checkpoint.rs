//! Core checkpoint data structures for state persistence and resume
//!
//! This module defines [`Checkpoint`] - the durable record the execution
//! engine appends after every superstep - and [`RunStatus`], the status an
//! execution carries at the moment a snapshot is taken.
//!
//! # Record Layout
//!
//! A checkpoint captures everything needed to resume a thread from exactly
//! this point:
//!
//! ```text
//! Checkpoint
//!   ├─ id             unique identifier (uuid v4)
//!   ├─ thread_id      execution lineage this snapshot belongs to
//!   ├─ step           monotonically increasing step index (0 = initial input)
//!   ├─ state          full channel map at the end of the step
//!   ├─ pending_nodes  the node set scheduled to run next
//!   ├─ status         Running | Paused | Completed
//!   └─ ts             capture timestamp (UTC)
//! ```
//!
//! Checkpoints are immutable once written. A thread's checkpoints form an
//! append-only sequence, strictly increasing by `step`; the backends in this
//! crate reject violations with
//! [`DuplicateStep`](crate::error::CheckpointError::DuplicateStep) and
//! [`NonMonotonicStep`](crate::error::CheckpointError::NonMonotonicStep).
//!
//! # Examples
//!
//! ```rust
//! use weft_checkpoint::{Checkpoint, RunStatus};
//! use serde_json::json;
//! use std::collections::BTreeSet;
//!
//! let checkpoint = Checkpoint::new(
//!     "thread-1",
//!     0,
//!     json!({"log": []}),
//!     BTreeSet::from(["ingest".to_string()]),
//!     RunStatus::Running,
//! );
//!
//! assert_eq!(checkpoint.step, 0);
//! assert!(!checkpoint.is_terminal());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Thread identifier - an opaque string naming one execution lineage
pub type ThreadId = String;

/// Execution status recorded in a checkpoint
///
/// `Failed` exists for completeness of the engine's state machine but never
/// appears in persisted history: a failed step commits nothing, so the last
/// good checkpoint keeps whatever status it had.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Execution is mid-flight; more supersteps follow
    Running,
    /// Execution paused at an interrupt point; resumable
    Paused,
    /// The terminal marker was reached; the thread is done
    Completed,
    /// A node or router failed; surfaced through errors, never persisted
    Failed,
}

/// Durable snapshot of a thread's state at the end of one superstep
///
/// The `state` field is the full channel map (a JSON object); `pending_nodes`
/// is the set of node ids scheduled for the next superstep, which is how a
/// resumed invocation knows where to pick up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Unique identifier for this snapshot
    pub id: String,

    /// Thread this checkpoint belongs to
    pub thread_id: ThreadId,

    /// Step index, strictly increasing per thread (0 = initial input)
    pub step: u64,

    /// Full channel map at the time of the snapshot
    pub state: serde_json::Value,

    /// Node ids scheduled to execute in the next superstep
    pub pending_nodes: BTreeSet<String>,

    /// Status the execution carried when this snapshot was taken
    pub status: RunStatus,

    /// Capture timestamp
    pub ts: DateTime<Utc>,
}

impl Checkpoint {
    /// Create a new checkpoint with a fresh id and current timestamp
    pub fn new(
        thread_id: impl Into<ThreadId>,
        step: u64,
        state: serde_json::Value,
        pending_nodes: BTreeSet<String>,
        status: RunStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            thread_id: thread_id.into(),
            step,
            state,
            pending_nodes,
            status,
            ts: Utc::now(),
        }
    }

    /// Whether this checkpoint marks the end of the thread's execution
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, RunStatus::Completed)
    }

    /// Whether this checkpoint is resumable at an interrupt point
    pub fn is_paused(&self) -> bool {
        matches!(self.status, RunStatus::Paused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checkpoint_creation() {
        let pending = BTreeSet::from(["a".to_string(), "b".to_string()]);
        let checkpoint = Checkpoint::new(
            "thread-1",
            3,
            json!({"count": 7}),
            pending.clone(),
            RunStatus::Running,
        );

        assert_eq!(checkpoint.thread_id, "thread-1");
        assert_eq!(checkpoint.step, 3);
        assert_eq!(checkpoint.pending_nodes, pending);
        assert!(!checkpoint.is_terminal());
        assert!(!checkpoint.is_paused());
    }

    #[test]
    fn test_status_predicates() {
        let done = Checkpoint::new(
            "t",
            1,
            json!({}),
            BTreeSet::new(),
            RunStatus::Completed,
        );
        assert!(done.is_terminal());

        let paused = Checkpoint::new(
            "t",
            1,
            json!({}),
            BTreeSet::from(["approve".to_string()]),
            RunStatus::Paused,
        );
        assert!(paused.is_paused());
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let checkpoint = Checkpoint::new(
            "thread-1",
            2,
            json!({"log": ["a", "b"]}),
            BTreeSet::from(["__end__".to_string()]),
            RunStatus::Completed,
        );

        let encoded = serde_json::to_string(&checkpoint).unwrap();
        let decoded: Checkpoint = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.id, checkpoint.id);
        assert_eq!(decoded.step, checkpoint.step);
        assert_eq!(decoded.state, checkpoint.state);
        assert_eq!(decoded.pending_nodes, checkpoint.pending_nodes);
        assert_eq!(decoded.status, checkpoint.status);
    }
}
