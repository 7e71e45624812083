//! Compiled graph and the superstep execution engine
//!
//! [`CompiledGraph`] is the immutable, executable form a
//! [`StateGraph`](crate::StateGraph) compiles into. Execution is a discrete
//! **superstep loop** driven by repeated [`invoke`](CompiledGraph::invoke)
//! calls rather than a suspended call stack, which is what lets a paused
//! thread be persisted, abandoned, or resumed from another process:
//!
//! 1. Resolve the active node set (the entry node on a fresh thread, the
//!    latest checkpoint's pending set otherwise).
//! 2. Pause here if an `interrupt_before` node is active (skipped on the
//!    first iteration of a resume, so progress is always made).
//! 3. Invoke every active node concurrently against its read-only state
//!    projection.
//! 4. Merge the partial updates through the channel reducers in lexical
//!    node-id order - deterministic regardless of completion order.
//! 5. Resolve the next active set through static edges and routers.
//! 6. Append one checkpoint carrying the merged state and the next set.
//! 7. Stop on completion (`END`), pause (`interrupt_after`), or loop.
//!
//! A node or router failure aborts the step before its checkpoint is
//! written: nothing is committed, the thread's last good checkpoint is
//! untouched, and re-invoking the thread replays from it.
//!
//! Threads are fully independent. Within one thread, invocations are
//! strictly serialized by an engine-held per-thread guard; a concurrent
//! `invoke` on the same thread id fails fast with
//! [`GraphError::ConcurrentInvocation`].

use crate::error::{GraphError, Result};
use crate::graph::{Edge, Graph, NodeId, END};
use crate::interrupt::InterruptConfig;
use crate::state::StateSchema;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use weft_checkpoint::{
    Checkpoint, CheckpointStore, CheckpointStream, MemoryCheckpointStore, RunStatus,
};

/// Result of one `invoke` call
///
/// `status` is [`RunStatus::Completed`] when the terminal marker was reached
/// and [`RunStatus::Paused`] when an interrupt point was hit; in the paused
/// case `pending_nodes` names the nodes the next `invoke(Value::Null, ..)`
/// will execute.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    /// Thread this invocation ran
    pub thread_id: String,

    /// Step index of the last committed checkpoint
    pub step: u64,

    /// State at the last committed checkpoint
    pub state: Value,

    /// Nodes scheduled for the next superstep
    pub pending_nodes: BTreeSet<NodeId>,

    /// How the invocation ended
    pub status: RunStatus,
}

/// Executable workflow graph
///
/// Cheap to share: execution state lives entirely in the checkpoint store,
/// so one `CompiledGraph` serves any number of threads concurrently.
pub struct CompiledGraph {
    graph: Arc<Graph>,
    schema: Arc<StateSchema>,
    entry: NodeId,
    store: Arc<dyn CheckpointStore>,
    interrupts: InterruptConfig,
    thread_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("entry", &self.entry)
            .field("interrupts", &self.interrupts)
            .finish_non_exhaustive()
    }
}

impl CompiledGraph {
    pub(crate) fn new(graph: Graph, schema: StateSchema) -> Self {
        // Validation ran before construction, so the entry point is set.
        let entry = graph.entry.clone().unwrap_or_default();
        Self {
            graph: Arc::new(graph),
            schema: Arc::new(schema),
            entry,
            store: Arc::new(MemoryCheckpointStore::new()),
            interrupts: InterruptConfig::default(),
            thread_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Replace the default in-memory checkpoint store with another backend
    pub fn with_store(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.store = store;
        self
    }

    /// Attach interrupt (pause point) configuration
    pub fn with_interrupts(mut self, interrupts: InterruptConfig) -> Self {
        self.interrupts = interrupts;
        self
    }

    /// Latest checkpoint for a thread, if any
    pub async fn get_state(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        Ok(self.store.get_latest(thread_id).await?)
    }

    /// Lazy stream of a thread's checkpoint history, oldest first
    pub async fn get_state_history(&self, thread_id: &str) -> Result<CheckpointStream> {
        Ok(self.store.history(thread_id).await?)
    }

    /// Execute the graph for one thread until completion, pause, or failure
    ///
    /// On a fresh thread, `input` is the initial state (a JSON object; `Null`
    /// means empty). On a thread with history, `Null` resumes from the latest
    /// checkpoint's pending nodes, while a non-null object is merged into the
    /// checkpointed state first - which is also how a failed step is retried
    /// with corrected input, and how a completed thread continues with a new
    /// turn from the entry point.
    ///
    /// # Errors
    ///
    /// [`GraphError::NodeExecution`] / [`GraphError::Routing`] abort the
    /// current step with nothing committed;
    /// [`GraphError::ConcurrentInvocation`] rejects a second in-flight
    /// invocation for the same thread.
    #[tracing::instrument(skip(self, input), fields(thread_id = %thread_id))]
    pub async fn invoke(&self, input: Value, thread_id: &str) -> Result<ExecutionOutcome> {
        let thread_lock = {
            let mut locks = self.thread_locks.lock().await;
            locks
                .entry(thread_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _in_flight = thread_lock.try_lock_owned().map_err(|_| {
            GraphError::ConcurrentInvocation {
                thread_id: thread_id.to_string(),
            }
        })?;

        tracing::info!("Starting graph execution");

        let latest = self.store.get_latest(thread_id).await?;

        let mut state;
        let mut active: BTreeSet<NodeId>;
        let mut step: u64;
        let mut resuming = false;

        match latest {
            None => {
                state = match input {
                    Value::Null => json!({}),
                    Value::Object(_) => input,
                    _ => {
                        return Err(GraphError::InvalidInput(
                            "initial state must be a JSON object".to_string(),
                        ))
                    }
                };
                active = BTreeSet::from([self.entry_node().clone()]);
                step = 0;

                // The thread's first checkpoint records the caller-supplied
                // input before anything executes.
                let paused = self.hits_interrupt_before(&active);
                let status = if paused {
                    RunStatus::Paused
                } else {
                    RunStatus::Running
                };
                self.store
                    .put(Checkpoint::new(
                        thread_id,
                        step,
                        state.clone(),
                        active.clone(),
                        status,
                    ))
                    .await?;

                if paused {
                    tracing::info!(pending = ?active, "Paused before entry node");
                    return Ok(self.outcome(thread_id, step, state, active, RunStatus::Paused));
                }
            }
            Some(checkpoint) => {
                state = checkpoint.state;
                step = checkpoint.step;

                if !input.is_null() {
                    if !input.is_object() {
                        return Err(GraphError::InvalidInput(
                            "resume input must be a JSON object or null".to_string(),
                        ));
                    }
                    self.schema.apply(&mut state, &input)?;
                }

                match checkpoint.status {
                    RunStatus::Paused => {
                        active = checkpoint.pending_nodes;
                        resuming = true;
                        tracing::debug!(step, pending = ?active, "Resuming paused thread");
                    }
                    RunStatus::Completed => {
                        if input.is_null() {
                            // Nothing new to do; report the final state again.
                            return Ok(self.outcome(
                                thread_id,
                                step,
                                state,
                                checkpoint.pending_nodes,
                                RunStatus::Completed,
                            ));
                        }
                        // New turn on a finished thread: routing restarts at
                        // the entry point over the accumulated state.
                        active = BTreeSet::from([self.entry_node().clone()]);
                        tracing::debug!(step, "Continuing completed thread from entry");
                    }
                    RunStatus::Running | RunStatus::Failed => {
                        active = checkpoint.pending_nodes;
                        tracing::debug!(step, pending = ?active, "Continuing thread");
                    }
                }
            }
        }

        loop {
            if active.len() == 1 && active.contains(END) {
                return Ok(self.outcome(thread_id, step, state, active, RunStatus::Completed));
            }

            if !resuming && self.hits_interrupt_before(&active) {
                step += 1;
                self.store
                    .put(Checkpoint::new(
                        thread_id,
                        step,
                        state.clone(),
                        active.clone(),
                        RunStatus::Paused,
                    ))
                    .await?;
                tracing::info!(step, pending = ?active, "Paused before interrupt node");
                return Ok(self.outcome(thread_id, step, state, active, RunStatus::Paused));
            }
            resuming = false;

            // Invoke every active node concurrently against its projection.
            // BTreeSet iteration gives lexical order, which fixes both the
            // spawn order and, below, the merge order.
            let node_ids: Vec<NodeId> = active.iter().cloned().collect();
            let mut invocations = Vec::with_capacity(node_ids.len());
            for id in &node_ids {
                let spec = self.graph.nodes.get(id).ok_or_else(|| {
                    GraphError::Execution(format!("active node '{}' is not in the graph", id))
                })?;
                let projection = project(&state, &spec.reads);
                invocations.push((spec.executor)(projection));
            }
            let results = futures::future::join_all(invocations).await;

            let mut updates = Vec::with_capacity(node_ids.len());
            for (id, result) in node_ids.iter().zip(results) {
                match result {
                    Ok(update) => updates.push((id.clone(), update)),
                    Err(error) => {
                        tracing::error!(node = %id, error = %error, "Node execution failed");
                        return Err(GraphError::node_execution(
                            thread_id,
                            step,
                            id.clone(),
                            error.to_string(),
                        ));
                    }
                }
            }

            // Merge in lexical node-id order. A reducer failure aborts the
            // whole step - no partial merge reaches the store because the
            // checkpoint is only written after every update lands.
            for (id, update) in &updates {
                if update.is_null() {
                    continue;
                }
                self.schema.apply(&mut state, update).map_err(|e| {
                    GraphError::node_execution(thread_id, step, id.clone(), e.to_string())
                })?;
            }

            let next = self.resolve_next(&active, &state, thread_id, step)?;

            step += 1;
            let completed = next.len() == 1 && next.contains(END);
            let status = if completed {
                RunStatus::Completed
            } else if self.hits_interrupt_after(&active) {
                RunStatus::Paused
            } else {
                RunStatus::Running
            };

            self.store
                .put(Checkpoint::new(
                    thread_id,
                    step,
                    state.clone(),
                    next.clone(),
                    status,
                ))
                .await?;
            tracing::debug!(step, ?status, "Superstep committed");

            match status {
                RunStatus::Completed => {
                    tracing::info!(step, "Graph execution completed");
                    return Ok(self.outcome(thread_id, step, state, next, RunStatus::Completed));
                }
                RunStatus::Paused => {
                    tracing::info!(step, pending = ?next, "Paused after interrupt node");
                    return Ok(self.outcome(thread_id, step, state, next, RunStatus::Paused));
                }
                _ => {
                    active = next;
                }
            }
        }
    }

    /// Resolve the next active set from static edges and routers
    ///
    /// Routers run against the post-merge state and must return a declared
    /// candidate or `END`. When a fan-out mixes `END` with live targets, the
    /// finished branch simply drops out; completion requires the whole set
    /// to resolve to `END`.
    fn resolve_next(
        &self,
        active: &BTreeSet<NodeId>,
        state: &Value,
        thread_id: &str,
        step: u64,
    ) -> Result<BTreeSet<NodeId>> {
        let mut next = BTreeSet::new();

        for node in active {
            let edges = self.graph.edges.get(node).ok_or_else(|| {
                GraphError::Execution(format!("node '{}' has no outgoing edges", node))
            })?;

            for edge in edges {
                match edge {
                    Edge::Direct(target) => {
                        next.insert(target.clone());
                    }
                    Edge::Conditional { router, candidates } => {
                        let choice = router(state);
                        if choice != END && !candidates.contains(&choice) {
                            tracing::error!(
                                node = %node,
                                returned = %choice,
                                "Router returned undeclared target"
                            );
                            return Err(GraphError::routing(thread_id, step, node.clone(), choice));
                        }
                        next.insert(choice);
                    }
                }
            }
        }

        if next.len() > 1 {
            next.remove(END);
        }

        if next.is_empty() {
            return Err(GraphError::Execution(format!(
                "no targets resolved from active set {:?} (thread '{}', step {})",
                active, thread_id, step
            )));
        }

        Ok(next)
    }

    fn entry_node(&self) -> &NodeId {
        &self.entry
    }

    fn hits_interrupt_before(&self, active: &BTreeSet<NodeId>) -> bool {
        active
            .iter()
            .any(|node| self.interrupts.interrupt_before.contains(node))
    }

    fn hits_interrupt_after(&self, active: &BTreeSet<NodeId>) -> bool {
        active
            .iter()
            .any(|node| self.interrupts.interrupt_after.contains(node))
    }

    fn outcome(
        &self,
        thread_id: &str,
        step: u64,
        state: Value,
        pending_nodes: BTreeSet<NodeId>,
        status: RunStatus,
    ) -> ExecutionOutcome {
        ExecutionOutcome {
            thread_id: thread_id.to_string(),
            step,
            state,
            pending_nodes,
            status,
        }
    }
}

/// Project state down to a node's declared read channels
///
/// An empty read list means the node sees the whole state.
fn project(state: &Value, reads: &[String]) -> Value {
    if reads.is_empty() {
        return state.clone();
    }

    let mut projection = serde_json::Map::new();
    if let Some(object) = state.as_object() {
        for channel in reads {
            if let Some(value) = object.get(channel) {
                projection.insert(channel.clone(), value.clone());
            }
        }
    }
    Value::Object(projection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_empty_reads_clones_state() {
        let state = json!({"a": 1, "b": 2});
        assert_eq!(project(&state, &[]), state);
    }

    #[test]
    fn test_project_filters_channels() {
        let state = json!({"a": 1, "b": 2, "c": 3});
        let projection = project(&state, &["a".to_string(), "c".to_string()]);
        assert_eq!(projection, json!({"a": 1, "c": 3}));
    }

    #[test]
    fn test_project_ignores_missing_channels() {
        let state = json!({"a": 1});
        let projection = project(&state, &["a".to_string(), "zz".to_string()]);
        assert_eq!(projection, json!({"a": 1}));
    }
}
