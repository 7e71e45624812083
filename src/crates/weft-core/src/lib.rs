//! # weft-core - Workflow Graph Execution Engine
//!
//! **Build stateful workflows as directed graphs** of async state-transform
//! nodes, executed as a deterministic superstep loop with durable
//! checkpointing and cooperative pause/resume.
//!
//! ## Core Concepts
//!
//! ### 1. StateGraph - the builder
//!
//! [`StateGraph`] assembles nodes, edges, conditional routers, the channel
//! schema, and the entry point, then compiles into an immutable
//! [`CompiledGraph`]. Compilation validates the whole structure (unknown
//! targets, duplicate ids, empty candidate sets, dead ends), so a graph that
//! compiles never references an undefined node at runtime. Cycles are
//! allowed - conditional edges routing backwards are how iterative workflows
//! loop.
//!
//! ### 2. Channels and reducers
//!
//! State is a JSON object of named channels. Nodes return partial updates;
//! the engine merges them through per-channel [`Reducer`]s
//! ([`OverwriteReducer`], [`AppendReducer`], or custom). Merges from
//! simultaneously active nodes apply in lexical node-id order, so results
//! are reproducible regardless of task scheduling.
//!
//! ### 3. Supersteps and checkpoints
//!
//! Execution advances in discrete supersteps: invoke the active nodes, merge
//! their updates, resolve routing, append one [`Checkpoint`]. Every thread's
//! history is append-only and strictly increasing by step, which gives crash
//! recovery and audit trails for free. Storage is pluggable behind
//! [`CheckpointStore`] (in-memory by default).
//!
//! ### 4. Interrupts
//!
//! [`InterruptConfig`] declares nodes to pause before or after. A pause
//! persists a resumable checkpoint and returns control entirely;
//! `invoke(Value::Null, thread_id)` picks up exactly where execution
//! stopped.
//!
//! ## Quick Start
//!
//! ```rust
//! use weft_core::{StateGraph, END};
//! use weft_core::state::{AppendReducer, StateSchema};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut schema = StateSchema::new();
//!     schema.add_channel("log", Box::new(AppendReducer));
//!
//!     let mut graph = StateGraph::with_schema(schema);
//!     graph.add_node("a", |_state| {
//!         Box::pin(async move { Ok(json!({"log": ["a"]})) })
//!     });
//!     graph.add_node("b", |_state| {
//!         Box::pin(async move { Ok(json!({"log": ["b"]})) })
//!     });
//!     graph.set_entry_point("a");
//!     graph.add_edge("a", "b");
//!     graph.add_edge("b", END);
//!
//!     let compiled = graph.compile()?;
//!     let outcome = compiled.invoke(json!({"log": []}), "thread-1").await?;
//!
//!     assert_eq!(outcome.state["log"], json!(["a", "b"]));
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod compiled;
pub mod error;
pub mod graph;
pub mod interrupt;
pub mod state;

pub use builder::StateGraph;
pub use compiled::{CompiledGraph, ExecutionOutcome};
pub use error::{GraphError, Result};
pub use graph::{Edge, NodeExecutor, NodeId, NodeSpec, RouterFn, END};
pub use interrupt::InterruptConfig;
pub use state::{AppendReducer, OverwriteReducer, Reducer, StateSchema};

// Re-export the checkpoint surface callers interact with directly.
pub use weft_checkpoint::{
    Checkpoint, CheckpointError, CheckpointStore, CheckpointStream, FileCheckpointStore,
    MemoryCheckpointStore, RunStatus,
};
