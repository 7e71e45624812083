//! # weft-checkpoint - State Persistence for Graph Execution
//!
//! **Trait-based checkpoint abstractions and storage backends** for
//! persisting and restoring workflow graph execution state. Checkpoints make
//! execution durable: every superstep of a [`weft-core`] graph appends one
//! snapshot here, which is what enables crash recovery, pause/resume at
//! interrupt points, and append-only audit trails per thread.
//!
//! ## Core Concepts
//!
//! ### Checkpoints
//!
//! A [`Checkpoint`] is an immutable snapshot of one thread's execution at the
//! end of one superstep: the full channel map, the set of nodes scheduled to
//! run next, the execution [`RunStatus`], and a strictly increasing step
//! index. A thread's checkpoints form an append-only sequence - they are
//! never rewritten, only appended to.
//!
//! ### The CheckpointStore trait
//!
//! [`CheckpointStore`] is the narrow contract the engine persists through:
//!
//! - `put()` - append a checkpoint (rejects duplicate or backwards steps)
//! - `get_latest()` - most recent checkpoint for a thread
//! - `history()` - lazy, restartable stream of a thread's checkpoints
//! - `delete_thread()` - explicit caller-driven deletion
//!
//! ### Backends
//!
//! - [`MemoryCheckpointStore`] - thread-safe in-memory map; development and
//!   tests
//! - [`FileCheckpointStore`] - append-only JSON Lines log per thread;
//!   survives restarts
//! - Custom - implement [`CheckpointStore`] over any database or service
//!
//! ### Serialization
//!
//! Byte-oriented backends encode through [`SerializerProtocol`];
//! [`JsonSerializer`] is the default and [`BincodeSerializer`] offers a
//! compact binary alternative.
//!
//! ## Quick Start
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
//!             "conversation-1",
//!             0,
//!             json!({"messages": []}),
//!             BTreeSet::from(["respond".to_string()]),
//!             RunStatus::Running,
//!         ))
//!         .await?;
//!
//!     let latest = store.get_latest("conversation-1").await?.unwrap();
//!     assert_eq!(latest.step, 0);
//!     Ok(())
//! }
//! ```
//!
//! [`weft-core`]: https://docs.rs/weft-core

pub mod checkpoint;
pub mod error;
pub mod file;
pub mod memory;
pub mod serializer;
pub mod traits;

pub use checkpoint::{Checkpoint, RunStatus, ThreadId};
pub use error::{CheckpointError, Result};
pub use file::FileCheckpointStore;
pub use memory::MemoryCheckpointStore;
pub use serializer::{BincodeSerializer, JsonSerializer, SerializerProtocol};
pub use traits::{CheckpointStore, CheckpointStream};
