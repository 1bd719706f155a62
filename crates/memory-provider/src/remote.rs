// SPDX-License-Identifier: MIT OR Apache-2.0
//! Documents the RPC seam a networked deployment would fill in. No
//! transport is implemented: cross-process replication is out of scope
//! for this store, so every method fails with `Internal`.

use async_trait::async_trait;
use memory_checkpoint::{BranchRequest, BranchResult, NewCheckpoint, SaveOptions};
use memory_core::Checkpoint;
use memory_error::{MemoryError, MemoryResult};
use memory_retrieval::{QueryRequest, RetrievalResult};
use memory_shortterm::{FlushResult, StoreRequest, StoreResult};
use memory_write::WriteOutcome;

use crate::MemoryProvider;

/// A [`MemoryProvider`] addressing a memory store over the network.
///
/// Carries only the endpoint a real implementation would dial; every
/// method currently fails with `Internal`, naming the endpoint so a
/// caller sees what wiring is still missing rather than a silent no-op.
pub struct RemoteMemoryProvider {
    endpoint: String,
}

impl RemoteMemoryProvider {
    /// Construct a remote provider pointed at `endpoint`. The endpoint is
    /// recorded but never dialed.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    fn not_implemented(&self) -> MemoryError {
        MemoryError::internal(format!(
            "remote memory provider transport to '{}' is not implemented",
            self.endpoint
        ))
    }
}

#[async_trait]
impl MemoryProvider for RemoteMemoryProvider {
    async fn store(&self, _record: memory_core::NewMemoryRecord) -> MemoryResult<WriteOutcome> {
        Err(self.not_implemented())
    }

    async fn store_short_term(&self, _request: StoreRequest) -> MemoryResult<StoreResult> {
        Err(self.not_implemented())
    }

    async fn flush_expired_short_term(&self) -> MemoryResult<FlushResult> {
        Err(self.not_implemented())
    }

    async fn save_checkpoint(&self, _new: NewCheckpoint, _options: SaveOptions) -> MemoryResult<Checkpoint> {
        Err(self.not_implemented())
    }

    async fn rollback(&self, _id: &str) -> MemoryResult<Checkpoint> {
        Err(self.not_implemented())
    }

    async fn branch(&self, _request: BranchRequest) -> MemoryResult<BranchResult> {
        Err(self.not_implemented())
    }

    async fn query(&self, _request: QueryRequest) -> MemoryResult<RetrievalResult> {
        Err(self.not_implemented())
    }
}
