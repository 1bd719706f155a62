// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `MemoryProvider` capability interface: a narrow async trait wiring
//! the write workflow (C5), short-term layer (C6), checkpoint engine (C7),
//! and retrieval pipeline (C8) against a chosen set of collaborators.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod local;
mod remote;

pub use local::LocalMemoryProvider;
pub use remote::RemoteMemoryProvider;

use async_trait::async_trait;
use memory_checkpoint::{BranchRequest, BranchResult, NewCheckpoint, SaveOptions};
use memory_core::Checkpoint;
use memory_error::MemoryResult;
use memory_retrieval::{QueryRequest, RetrievalResult};
use memory_shortterm::{FlushResult, StoreRequest, StoreResult};
use memory_write::WriteOutcome;

/// The capability surface exposed to callers of the memory store: one
/// method per hard component (C5/C6/C7/C8), independent of how each is
/// actually wired or where its collaborators live.
#[async_trait]
pub trait MemoryProvider: Send + Sync {
    /// C5: normalize, persist, and index a new memory record.
    async fn store(&self, record: memory_core::NewMemoryRecord) -> MemoryResult<WriteOutcome>;

    /// C6: append an entry to a session's scratchpad, promoting
    /// synchronously if its importance crosses the configured threshold.
    async fn store_short_term(&self, request: StoreRequest) -> MemoryResult<StoreResult>;

    /// C6: evict every session entry past its time-to-live.
    async fn flush_expired_short_term(&self) -> MemoryResult<FlushResult>;

    /// C7: save a new checkpoint, then prune by TTL and retention.
    async fn save_checkpoint(&self, new: NewCheckpoint, options: SaveOptions) -> MemoryResult<Checkpoint>;

    /// C7: restore a checkpoint by id.
    async fn rollback(&self, id: &str) -> MemoryResult<Checkpoint>;

    /// C7: fan a checkpoint out into sibling branches.
    async fn branch(&self, request: BranchRequest) -> MemoryResult<BranchResult>;

    /// C8: run the hybrid retrieval pipeline for one query.
    async fn query(&self, request: QueryRequest) -> MemoryResult<RetrievalResult>;
}
