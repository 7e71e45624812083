//! Error types for checkpoint operations

use thiserror::Error;

/// Result type for checkpoint operations
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors that can occur during checkpoint operations
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// A checkpoint with this step index already exists for the thread
    ///
    /// Checkpoint histories are append-only; re-writing an existing step is
    /// always a caller bug rather than a recoverable condition.
    #[error("Duplicate checkpoint step {step} for thread '{thread_id}'")]
    DuplicateStep {
        /// Thread whose history was being appended to
        thread_id: String,
        /// Step index that was already present
        step: u64,
    },

    /// Attempted to append a checkpoint with a step index lower than the
    /// latest recorded one
    #[error(
        "Non-monotonic checkpoint step {step} for thread '{thread_id}' (latest is {latest})"
    )]
    NonMonotonicStep {
        /// Thread whose history was being appended to
        thread_id: String,
        /// Step index that was rejected
        step: u64,
        /// Latest step currently recorded for the thread
        latest: u64,
    },

    /// Checkpoint or thread not found
    #[error("Checkpoint not found: {0}")]
    NotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Binary serialization error
    #[error("Binary serialization error: {0}")]
    BinarySerialization(#[from] bincode::Error),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid checkpoint or request
    #[error("Invalid checkpoint: {0}")]
    Invalid(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
