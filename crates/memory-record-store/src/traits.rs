// SPDX-License-Identifier: MIT OR Apache-2.0
//! The C1 record-store contract and its neighboring checkpoint and
//! relationship tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memory_core::{Checkpoint, MemoryRecord};
use memory_error::MemoryResult;
use serde::{Deserialize, Serialize};

use crate::filter::RecordFilter;

/// Durable mapping id → [`MemoryRecord`], plus full-text search.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a brand-new record. Fails with `Storage` on a write error.
    async fn insert(&self, record: MemoryRecord) -> MemoryResult<()>;

    /// Fetch a record by id.
    async fn get(&self, id: &str) -> MemoryResult<Option<MemoryRecord>>;

    /// Flip `vector_indexed` for a record in place, without touching any
    /// other field.
    async fn set_vector_indexed(&self, id: &str, value: bool) -> MemoryResult<()>;

    /// Full-text search over `content`, additionally constrained by
    /// `filters` (every filter must match — `must`-AND).
    async fn search_fts(
        &self,
        query: &str,
        filters: &[RecordFilter],
        limit: usize,
    ) -> MemoryResult<Vec<MemoryRecord>>;
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    /// Items in this page.
    pub items: Vec<T>,
    /// Cursor to pass to the next call, if more items remain.
    pub next_cursor: Option<DateTime<Utc>>,
}

/// The `checkpoints` table, sharing the C1 backend under a separate
/// namespace from `memories`.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Insert or overwrite a checkpoint by id.
    async fn upsert(&self, checkpoint: Checkpoint) -> MemoryResult<()>;

    /// `true` iff a checkpoint with this id already exists.
    async fn exists(&self, id: &str) -> MemoryResult<bool>;

    /// Fetch a checkpoint by id.
    async fn get(&self, id: &str) -> MemoryResult<Option<Checkpoint>>;

    /// Delete a checkpoint by id, returning whether one was removed.
    async fn remove(&self, id: &str) -> MemoryResult<bool>;

    /// List checkpoints ordered by `created_at` DESC, at most `limit` items,
    /// starting strictly before `cursor` when given.
    async fn list(&self, limit: usize, cursor: Option<DateTime<Utc>>) -> MemoryResult<Page<Checkpoint>>;

    /// Total number of stored checkpoints.
    async fn count(&self) -> MemoryResult<usize>;

    /// Delete every checkpoint whose `created_at` predates `cutoff`,
    /// returning the number removed.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> MemoryResult<usize>;

    /// Delete the `count` oldest checkpoints, returning the number removed.
    async fn delete_oldest(&self, count: usize) -> MemoryResult<usize>;
}

/// A row of the `memory_relationships` table: a user-defined edge between
/// two records, kept separate from the retrieval pipeline's graph model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationshipRecord {
    /// Relationship id.
    pub id: String,
    /// Source record id.
    pub source_id: String,
    /// Target record id.
    pub target_id: String,
    /// Caller-defined relationship type name.
    pub relationship_type: String,
    /// Relationship strength, `0.0..=1.0` by convention.
    pub strength: f64,
    /// Whether the relationship should be read both directions.
    pub bidirectional: bool,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// The `memory_relationships` surface: kept outside the C8 retrieval
/// pipeline (see design notes) and exposed only for direct CRUD.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Insert a relationship.
    async fn create(&self, relationship: RelationshipRecord) -> MemoryResult<()>;

    /// Find relationships touching `record_id` as either endpoint.
    async fn find(&self, record_id: &str) -> MemoryResult<Vec<RelationshipRecord>>;

    /// Delete a relationship by id, returning whether one was removed.
    async fn delete(&self, id: &str) -> MemoryResult<bool>;
}
