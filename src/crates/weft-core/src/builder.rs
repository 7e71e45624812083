//! StateGraph builder API for constructing workflow graphs
//!
//! [`StateGraph`] is the primary entry point: register nodes, wire edges,
//! name the entry point, then [`compile`](StateGraph::compile) into an
//! immutable, executable [`CompiledGraph`](crate::CompiledGraph). Compilation
//! is where every structural guarantee is checked - unknown targets,
//! duplicate node ids, empty candidate sets, dead ends - so a graph that
//! compiles cannot reference an undefined node at runtime.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use weft_core::{StateGraph, END};
//! use weft_core::state::{AppendReducer, StateSchema};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut schema = StateSchema::new();
//! schema.add_channel("log", Box::new(AppendReducer));
//!
//! let mut graph = StateGraph::with_schema(schema);
//!
//! graph.add_node("greet", |_state| {
//!     Box::pin(async move { Ok(json!({"log": ["hello"]})) })
//! });
//!
//! graph.set_entry_point("greet");
//! graph.add_edge("greet", END);
//!
//! let compiled = graph.compile()?;
//! let outcome = compiled.invoke(json!({"log": []}), "thread-1").await?;
//! assert_eq!(outcome.state["log"], json!(["hello"]));
//! # Ok(())
//! # }
//! ```
//!
//! # Conditional Routing
//!
//! Conditional edges declare their full candidate set up front; the router
//! picks one member (or [`END`](crate::graph::END)) at runtime based on the
//! post-merge state. Routing back to an earlier node is how loops are built:
//!
//! ```rust,no_run
//! use weft_core::{StateGraph, END};
//! use serde_json::json;
//!
//! # fn example(mut graph: StateGraph) {
//! graph.add_conditional_edge(
//!     "check",
//!     |state| {
//!         if state["retries"].as_i64().unwrap_or(0) < 3 {
//!             "work".to_string()
//!         } else {
//!             END.to_string()
//!         }
//!     },
//!     ["work", END],
//! );
//! # }
//! ```

use crate::compiled::CompiledGraph;
use crate::error::{GraphError, Result};
use crate::graph::{Graph, NodeExecutor, NodeId, NodeSpec, RouterFn};
use crate::state::StateSchema;
use serde_json::Value;
use std::collections::BTreeSet;
use std::error::Error;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Builder for constructing workflow graphs
///
/// Mutating methods return `&mut Self` so registrations chain; `compile`
/// consumes the builder and produces the shareable executable form.
pub struct StateGraph {
    graph: Graph,
    schema: StateSchema,
    duplicate_nodes: Vec<NodeId>,
}

impl StateGraph {
    /// Create a builder with an empty schema (all channels overwrite)
    pub fn new() -> Self {
        Self::with_schema(StateSchema::new())
    }

    /// Create a builder with the given channel schema
    pub fn with_schema(schema: StateSchema) -> Self {
        Self {
            graph: Graph::new(),
            schema,
            duplicate_nodes: Vec::new(),
        }
    }

    /// Register a node that sees the whole state
    ///
    /// The executor receives the current state (read-only) and returns a
    /// partial channel update. Registering the same id twice is recorded and
    /// rejected at [`compile`](Self::compile).
    pub fn add_node<F>(&mut self, id: impl Into<NodeId>, executor: F) -> &mut Self
    where
        F: Fn(Value) -> Pin<Box<dyn Future<Output = std::result::Result<Value, Box<dyn Error + Send + Sync>>> + Send>>
            + Send
            + Sync
            + 'static,
    {
        self.add_node_with_reads(id, Vec::new(), executor)
    }

    /// Register a node that sees only the named channels
    ///
    /// The executor's input is the state projected down to `reads`, which
    /// makes the node's actual data dependencies explicit and keeps unrelated
    /// channels out of reach.
    pub fn add_node_with_reads<F>(
        &mut self,
        id: impl Into<NodeId>,
        reads: Vec<String>,
        executor: F,
    ) -> &mut Self
    where
        F: Fn(Value) -> Pin<Box<dyn Future<Output = std::result::Result<Value, Box<dyn Error + Send + Sync>>> + Send>>
            + Send
            + Sync
            + 'static,
    {
        let id = id.into();
        if self.graph.nodes.contains_key(&id) {
            self.duplicate_nodes.push(id.clone());
        }

        let spec = NodeSpec {
            name: id.clone(),
            executor: Arc::new(executor) as NodeExecutor,
            reads,
        };
        self.graph.add_node(id, spec);
        self
    }

    /// Add a direct edge between two nodes
    pub fn add_edge(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> &mut Self {
        self.graph.add_edge(from.into(), to.into());
        self
    }

    /// Add a conditional edge with a router and its declared candidates
    ///
    /// At runtime the router must return a member of `candidates` or
    /// [`END`](crate::graph::END); anything else fails the invocation with
    /// [`GraphError::Routing`].
    pub fn add_conditional_edge<F, I, S>(
        &mut self,
        from: impl Into<NodeId>,
        router: F,
        candidates: I,
    ) -> &mut Self
    where
        F: Fn(&Value) -> NodeId + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        let candidates: BTreeSet<NodeId> = candidates.into_iter().map(Into::into).collect();
        self.graph
            .add_conditional_edge(from.into(), Arc::new(router) as RouterFn, candidates);
        self
    }

    /// Set the node where execution begins
    pub fn set_entry_point(&mut self, id: impl Into<NodeId>) -> &mut Self {
        self.graph.set_entry(id.into());
        self
    }

    /// Validate the graph and produce an executable [`CompiledGraph`]
    ///
    /// # Errors
    ///
    /// [`GraphError::Validation`] when the entry point is unset or unknown,
    /// an edge references an unknown node, a node id was registered twice, a
    /// conditional edge declares no candidates, or a node has no outgoing
    /// edge.
    pub fn compile(self) -> Result<CompiledGraph> {
        if let Some(id) = self.duplicate_nodes.first() {
            return Err(GraphError::Validation(format!(
                "Node '{}' is registered more than once",
                id
            )));
        }

        self.graph.validate().map_err(GraphError::Validation)?;

        Ok(CompiledGraph::new(self.graph, self.schema))
    }
}

impl Default for StateGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::END;
    use serde_json::json;

    fn noop(state: Value) -> Pin<Box<dyn Future<Output = std::result::Result<Value, Box<dyn Error + Send + Sync>>> + Send>> {
        let _ = state;
        Box::pin(async move { Ok(Value::Null) })
    }

    #[test]
    fn test_compile_valid_graph() {
        let mut graph = StateGraph::new();
        graph.add_node("a", noop);
        graph.add_node("b", noop);
        graph.set_entry_point("a");
        graph.add_edge("a", "b");
        graph.add_edge("b", END);

        assert!(graph.compile().is_ok());
    }

    #[test]
    fn test_compile_rejects_duplicate_node() {
        let mut graph = StateGraph::new();
        graph.add_node("a", noop);
        graph.add_node("a", noop);
        graph.set_entry_point("a");
        graph.add_edge("a", END);

        let err = graph.compile().unwrap_err();
        assert!(matches!(err, GraphError::Validation(ref msg) if msg.contains("more than once")));
    }

    #[test]
    fn test_compile_rejects_unset_entry() {
        let mut graph = StateGraph::new();
        graph.add_node("a", noop);
        graph.add_edge("a", END);

        assert!(matches!(
            graph.compile().unwrap_err(),
            GraphError::Validation(_)
        ));
    }

    #[test]
    fn test_compile_rejects_unknown_target() {
        let mut graph = StateGraph::new();
        graph.add_node("a", noop);
        graph.set_entry_point("a");
        graph.add_edge("a", "ghost");

        assert!(matches!(
            graph.compile().unwrap_err(),
            GraphError::Validation(ref msg) if msg.contains("ghost")
        ));
    }

    #[test]
    fn test_compile_rejects_empty_candidates() {
        let mut graph = StateGraph::new();
        graph.add_node("a", noop);
        graph.set_entry_point("a");
        graph.add_conditional_edge("a", |_state| END.to_string(), Vec::<String>::new());

        assert!(matches!(
            graph.compile().unwrap_err(),
            GraphError::Validation(ref msg) if msg.contains("candidate")
        ));
    }

    #[test]
    fn test_builder_chains() {
        let mut graph = StateGraph::new();
        graph
            .add_node("a", |_state| Box::pin(async move { Ok(json!({"x": 1})) }))
            .set_entry_point("a")
            .add_edge("a", END);

        assert!(graph.compile().is_ok());
    }
}
