// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Shared data model for the agentic memory store: memory records,
//! short-term sessions, checkpoints, and the consumed graph model, plus
//! the normalization and redaction rules every component crate builds on.

pub mod checkpoint;
pub mod clock;
pub mod graph;
pub mod record;
pub mod redact;
pub mod shortterm;

pub use checkpoint::{Checkpoint, CheckpointMeta, BRANCH_ID_PREFIX, CHECKPOINT_ID_PREFIX};
pub use clock::{Clock, ManualClock, SystemClock};
pub use graph::{default_allowed_edges, ChunkReference, Edge, EdgeType, Node, NodeType};
pub use record::{MemoryLayer, MemoryRecord, NewMemoryRecord};
pub use redact::scrub;
pub use shortterm::{Session, ShortTermEntry};
