//! Cooperative pause points for human-in-the-loop workflows
//!
//! [`InterruptConfig`] declares, per compiled-graph invocation, the nodes the
//! engine should pause around: `interrupt_before` stops a superstep before
//! the named nodes execute, `interrupt_after` stops it once their outputs
//! have been merged and routed. Both default to empty, which is fully
//! automatic execution.
//!
//! The configuration is purely declarative - it never alters the graph, only
//! gates the engine's step loop. A pause persists a `Paused` checkpoint and
//! returns control to the caller entirely; resuming is a fresh
//! `invoke(Value::Null, thread_id)` call, and the interrupt that caused the
//! pause is not re-checked for the resumed nodes, so execution always makes
//! forward progress.
//!
//! # Examples
//!
//! ```rust,no_run
//! use weft_core::{InterruptConfig, StateGraph};
//!
//! # fn example(graph: StateGraph) -> Result<(), weft_core::GraphError> {
//! let interrupts = InterruptConfig::new()
//!     .with_interrupt_before(["execute_trade"])
//!     .with_interrupt_after(["risk_review"]);
//!
//! let compiled = graph.compile()?.with_interrupts(interrupts);
//! # Ok(())
//! # }
//! ```

use crate::graph::NodeId;
use std::collections::HashSet;

/// Declarative pause points applied to an execution
#[derive(Debug, Clone, Default)]
pub struct InterruptConfig {
    /// Nodes to pause before executing
    pub interrupt_before: HashSet<NodeId>,

    /// Nodes to pause after executing (and routing)
    pub interrupt_after: HashSet<NodeId>,
}

impl InterruptConfig {
    /// Create an empty configuration (no pauses)
    pub fn new() -> Self {
        Self::default()
    }

    /// Pause before any of the given nodes executes
    pub fn with_interrupt_before<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.interrupt_before.extend(nodes.into_iter().map(Into::into));
        self
    }

    /// Pause after any of the given nodes executes
    pub fn with_interrupt_after<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.interrupt_after.extend(nodes.into_iter().map(Into::into));
        self
    }

    /// Whether any pause point is configured
    pub fn is_empty(&self) -> bool {
        self.interrupt_before.is_empty() && self.interrupt_after.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(InterruptConfig::new().is_empty());
    }

    #[test]
    fn test_builder_accumulates() {
        let config = InterruptConfig::new()
            .with_interrupt_before(["a", "b"])
            .with_interrupt_before(["c"])
            .with_interrupt_after(["d"]);

        assert_eq!(config.interrupt_before.len(), 3);
        assert!(config.interrupt_before.contains("c"));
        assert!(config.interrupt_after.contains("d"));
        assert!(!config.is_empty());
    }
}
