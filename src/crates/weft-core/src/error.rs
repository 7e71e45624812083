//! Error types for graph construction and execution
//!
//! All failures surface through [`GraphError`] with enough context - thread
//! id, step, node id - to diagnose and retry. The engine performs no
//! automatic retries: a failed invocation leaves the last good checkpoint
//! untouched, and retry policy is layered above this crate by the caller.

use crate::state::StateError;
use thiserror::Error;

/// Convenience result type using [`GraphError`]
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised while building, compiling, or executing a graph
#[derive(Error, Debug)]
pub enum GraphError {
    /// Graph structure validation failed at compile time; the graph never
    /// runs
    #[error("Graph validation failed: {0}")]
    Validation(String),

    /// A node's transform failed during execution
    ///
    /// The current step is aborted with no partial merge committed; the
    /// thread's last good checkpoint is preserved. Re-invoking the thread
    /// replays from that checkpoint.
    #[error("Node '{node}' failed at step {step} of thread '{thread_id}': {error}")]
    NodeExecution {
        /// Thread being executed
        thread_id: String,
        /// Step index that was executing
        step: u64,
        /// Node whose transform failed
        node: String,
        /// Error reported by the node
        error: String,
    },

    /// A conditional router returned a target outside its declared candidate
    /// set
    ///
    /// Fatal for this invocation, not for the thread - the checkpoint
    /// history up to the last good step is preserved.
    #[error(
        "Router at node '{node}' returned undeclared target '{returned}' \
         (step {step}, thread '{thread_id}')"
    )]
    Routing {
        /// Thread being executed
        thread_id: String,
        /// Step index that was executing
        step: u64,
        /// Node whose router misbehaved
        node: String,
        /// The undeclared target it returned
        returned: String,
    },

    /// A second `invoke` was issued for a thread that already has one in
    /// flight
    ///
    /// Surfaced immediately with no state mutation; per-thread execution is
    /// strictly serialized.
    #[error("Thread '{thread_id}' already has an invocation in flight")]
    ConcurrentInvocation {
        /// Thread that was double-invoked
        thread_id: String,
    },

    /// General execution error without node context
    #[error("Execution failed: {0}")]
    Execution(String),

    /// Caller-supplied input was not usable as state
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// State management error outside any node's merge
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Checkpoint persistence error
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] weft_checkpoint::CheckpointError),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GraphError {
    /// Create a node execution error with full context
    pub fn node_execution(
        thread_id: impl Into<String>,
        step: u64,
        node: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::NodeExecution {
            thread_id: thread_id.into(),
            step,
            node: node.into(),
            error: error.into(),
        }
    }

    /// Create a routing error with full context
    pub fn routing(
        thread_id: impl Into<String>,
        step: u64,
        node: impl Into<String>,
        returned: impl Into<String>,
    ) -> Self {
        Self::Routing {
            thread_id: thread_id.into(),
            step,
            node: node.into(),
            returned: returned.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_execution_display() {
        let err = GraphError::node_execution("t1", 3, "llm", "connection refused");
        let message = err.to_string();
        assert!(message.contains("llm"));
        assert!(message.contains("step 3"));
        assert!(message.contains("t1"));
    }

    #[test]
    fn test_routing_display() {
        let err = GraphError::routing("t1", 2, "decide", "nowhere");
        let message = err.to_string();
        assert!(message.contains("decide"));
        assert!(message.contains("nowhere"));
    }

    #[test]
    fn test_checkpoint_error_converts() {
        let source = weft_checkpoint::CheckpointError::DuplicateStep {
            thread_id: "t1".to_string(),
            step: 4,
        };
        let err: GraphError = source.into();
        assert!(matches!(err, GraphError::Checkpoint(_)));
    }
}
