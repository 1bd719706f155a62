// SPDX-License-Identifier: MIT OR Apache-2.0
//! The mutable draft each write stage inspects and advances.

use memory_core::{MemoryRecord, NewMemoryRecord};

/// State threaded through the three write stages.
pub struct WriteContext {
    /// Caller input, consumed by the prepare stage.
    pub input: Option<NewMemoryRecord>,
    /// The record once id/timestamp have been assigned and it has been
    /// normalized, populated by the prepare stage.
    pub record: Option<MemoryRecord>,
    /// Whether the vector store acknowledged the upsert. `false` until the
    /// index stage succeeds.
    pub vector_indexed: bool,
}

impl WriteContext {
    /// Start a context from caller input.
    #[must_use]
    pub fn new(input: NewMemoryRecord) -> Self {
        Self {
            input: Some(input),
            record: None,
            vector_indexed: false,
        }
    }
}

/// The public result of a successful `run_store`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// The persisted record's id.
    pub id: String,
    /// Whether the vector store acknowledged the upsert at the time
    /// `run_store` returned.
    pub vector_indexed: bool,
}
