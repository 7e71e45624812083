//! Core graph data structures and types
//!
//! This module defines the building blocks of an executable workflow graph:
//! nodes ([`NodeSpec`]), edges ([`Edge`]), and the [`Graph`] container that
//! [`StateGraph`](crate::StateGraph) assembles and validates. A compiled
//! graph is immutable and can be shared read-only across any number of
//! concurrently executing threads.
//!
//! # Structure
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                    Graph                       │
//! │                                                │
//! │  entry ──► ┌─────────┐   Direct edge           │
//! │            │ ingest  │──────────────┐          │
//! │            └─────────┘              ▼          │
//! │                               ┌──────────┐     │
//! │            ┌─────────┐◄──────│  decide  │     │
//! │            │  retry  │ Cond. └──────────┘     │
//! │            └─────────┘  edge       │          │
//! │                                    ▼          │
//! │                                   END          │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! Nodes are async transforms over a read-only projection of the shared
//! state; they return a partial channel update that the engine merges through
//! the schema reducers in [`state`](crate::state). Edges are either direct
//! (one fixed target) or conditional (a router function choosing among a
//! declared candidate set). Cycles are permitted - a conditional edge routing
//! back to an earlier node is how iterative workflows loop - and bounding
//! such loops is the caller's responsibility.

use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Node identifier - unique name for each node in the graph
pub type NodeId = String;

/// Special node identifier marking graph termination
///
/// `END` is a virtual target: routing to it signals that a branch of
/// execution is finished. When the whole active set resolves to `END`, the
/// thread completes. It never executes any logic and cannot be registered as
/// a real node.
///
/// # Examples
///
/// ```rust
/// use weft_core::graph::END;
///
/// assert_eq!(END, "__end__");
/// ```
pub const END: &str = "__end__";

/// Node executor function type
///
/// An executor is an async function from the node's read-only state
/// projection to a **partial state update** - a JSON object containing only
/// the channels the node wants to write (or `null` for no writes). It must
/// never mutate shared state directly; the engine merges the returned update
/// through the channel reducers.
///
/// # Examples
///
/// ```rust
/// use weft_core::graph::NodeExecutor;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let executor: NodeExecutor = Arc::new(|state| {
///     Box::pin(async move {
///         let seen = state["count"].as_i64().unwrap_or(0);
///         Ok(json!({"count": seen + 1}))
///     })
/// });
/// ```
pub type NodeExecutor = Arc<
    dyn Fn(
            Value,
        )
            -> Pin<Box<dyn Future<Output = Result<Value, Box<dyn Error + Send + Sync>>> + Send>>
        + Send
        + Sync,
>;

/// Router function type for conditional edges
///
/// Routers receive the full post-merge state and return the id of the next
/// node, which must be one of the edge's declared candidates (or [`END`]).
/// Returning anything else fails the invocation with a routing error.
pub type RouterFn = Arc<dyn Fn(&Value) -> NodeId + Send + Sync>;

/// Node specification - one processing unit in the graph
#[derive(Clone)]
pub struct NodeSpec {
    /// Node name, used in logs and error context
    pub name: String,

    /// Async transform executed when the node is active
    pub executor: NodeExecutor,

    /// Channels this node reads - its input is projected down to these.
    /// Empty means the node sees the whole state.
    pub reads: Vec<String>,
}

impl std::fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeSpec")
            .field("name", &self.name)
            .field("executor", &"<function>")
            .field("reads", &self.reads)
            .finish()
    }
}

/// Edge defining a transition between nodes
///
/// A `Direct` edge always proceeds to its fixed target. A `Conditional` edge
/// invokes its router against the post-merge state to pick one target from
/// the declared candidate set; the set is validated at compile time so every
/// reachable target is known before the graph ever runs.
#[derive(Clone)]
pub enum Edge {
    /// Unconditional transition to a fixed target
    Direct(NodeId),

    /// Dynamic transition chosen by a router function
    Conditional {
        /// Router invoked with the post-merge state
        router: RouterFn,

        /// Every node id the router may legally return ([`END`] is always
        /// accepted in addition)
        candidates: BTreeSet<NodeId>,
    },
}

impl std::fmt::Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edge::Direct(target) => f.debug_tuple("Direct").field(target).finish(),
            Edge::Conditional { candidates, .. } => f
                .debug_struct("Conditional")
                .field("router", &"<function>")
                .field("candidates", candidates)
                .finish(),
        }
    }
}

/// Core graph structure containing nodes, edges, and the entry point
///
/// Built through [`StateGraph`](crate::StateGraph) rather than directly.
/// Once compiled the graph is immutable; the engine only ever reads it.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// All nodes mapped by their unique ids
    pub nodes: HashMap<NodeId, NodeSpec>,

    /// Outgoing edges per source node
    pub edges: HashMap<NodeId, Vec<Edge>>,

    /// Node where execution begins; must be set before compilation
    pub entry: Option<NodeId>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, id: NodeId, spec: NodeSpec) {
        self.nodes.insert(id, spec);
    }

    /// Add a direct edge between two nodes
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        self.edges
            .entry(from)
            .or_insert_with(Vec::new)
            .push(Edge::Direct(to));
    }

    /// Add a conditional edge with a router and its candidate targets
    pub fn add_conditional_edge(
        &mut self,
        from: NodeId,
        router: RouterFn,
        candidates: BTreeSet<NodeId>,
    ) {
        self.edges
            .entry(from)
            .or_insert_with(Vec::new)
            .push(Edge::Conditional { router, candidates });
    }

    /// Set the entry point for graph execution
    pub fn set_entry(&mut self, node: NodeId) {
        self.entry = Some(node);
    }

    /// Validate the graph structure
    ///
    /// Checks that:
    /// - the entry point is set and names a registered node
    /// - no node uses the reserved [`END`] id
    /// - every edge source and target names a registered node (targets may
    ///   also be [`END`])
    /// - every conditional edge declares at least one candidate
    /// - every node has at least one outgoing edge (dead ends cannot reach
    ///   the terminal marker)
    ///
    /// Returns a descriptive message for the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        match &self.entry {
            None => return Err("Entry point is not set".to_string()),
            Some(entry) if !self.nodes.contains_key(entry) => {
                return Err(format!("Entry point '{}' does not exist", entry));
            }
            _ => {}
        }

        if self.nodes.contains_key(END) {
            return Err(format!("'{}' is reserved and cannot be a node id", END));
        }

        for (from, edges) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(format!("Edge source '{}' does not exist", from));
            }

            for edge in edges {
                match edge {
                    Edge::Direct(to) => {
                        if to != END && !self.nodes.contains_key(to) {
                            return Err(format!("Edge target '{}' does not exist", to));
                        }
                    }
                    Edge::Conditional { candidates, .. } => {
                        if candidates.is_empty() {
                            return Err(format!(
                                "Conditional edge from '{}' declares no candidate targets",
                                from
                            ));
                        }
                        for to in candidates {
                            if to != END && !self.nodes.contains_key(to) {
                                return Err(format!(
                                    "Candidate target '{}' does not exist",
                                    to
                                ));
                            }
                        }
                    }
                }
            }
        }

        for id in self.nodes.keys() {
            let has_outgoing = self
                .edges
                .get(id)
                .map(|edges| !edges.is_empty())
                .unwrap_or(false);
            if !has_outgoing {
                return Err(format!("Node '{}' has no outgoing edge", id));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_spec(name: &str) -> NodeSpec {
        NodeSpec {
            name: name.to_string(),
            executor: Arc::new(|_state| Box::pin(async move { Ok(Value::Null) })),
            reads: vec![],
        }
    }

    #[test]
    fn test_graph_creation() {
        let graph = Graph::new();
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
        assert!(graph.entry.is_none());
    }

    #[test]
    fn test_valid_linear_graph() {
        let mut graph = Graph::new();
        graph.add_node("a".to_string(), noop_spec("a"));
        graph.add_node("b".to_string(), noop_spec("b"));
        graph.add_edge("a".to_string(), "b".to_string());
        graph.add_edge("b".to_string(), END.to_string());
        graph.set_entry("a".to_string());

        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_missing_entry_point() {
        let mut graph = Graph::new();
        graph.add_node("a".to_string(), noop_spec("a"));
        graph.add_edge("a".to_string(), END.to_string());

        assert!(graph.validate().is_err());

        graph.set_entry("missing".to_string());
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_unknown_edge_target() {
        let mut graph = Graph::new();
        graph.add_node("a".to_string(), noop_spec("a"));
        graph.add_edge("a".to_string(), "ghost".to_string());
        graph.set_entry("a".to_string());

        let err = graph.validate().unwrap_err();
        assert!(err.contains("ghost"));
    }

    #[test]
    fn test_empty_candidate_set_rejected() {
        let mut graph = Graph::new();
        graph.add_node("a".to_string(), noop_spec("a"));
        graph.add_conditional_edge(
            "a".to_string(),
            Arc::new(|_state| END.to_string()),
            BTreeSet::new(),
        );
        graph.set_entry("a".to_string());

        let err = graph.validate().unwrap_err();
        assert!(err.contains("no candidate targets"));
    }

    #[test]
    fn test_dead_end_node_rejected() {
        let mut graph = Graph::new();
        graph.add_node("a".to_string(), noop_spec("a"));
        graph.add_node("sink".to_string(), noop_spec("sink"));
        graph.add_edge("a".to_string(), "sink".to_string());
        graph.set_entry("a".to_string());

        let err = graph.validate().unwrap_err();
        assert!(err.contains("sink"));
    }

    #[test]
    fn test_cycles_are_permitted() {
        let mut graph = Graph::new();
        graph.add_node("work".to_string(), noop_spec("work"));
        graph.add_node("check".to_string(), noop_spec("check"));
        graph.add_edge("work".to_string(), "check".to_string());
        graph.add_conditional_edge(
            "check".to_string(),
            Arc::new(|_state| END.to_string()),
            BTreeSet::from(["work".to_string(), END.to_string()]),
        );
        graph.set_entry("work".to_string());

        assert!(graph.validate().is_ok());
    }
}
