// SPDX-License-Identifier: MIT OR Apache-2.0
//! Types for the C2 vector-store contract.

use async_trait::async_trait;
use memory_error::MemoryResult;
use memory_record_store::RecordFilter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Distance metric a collection is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    /// Cosine similarity.
    Cosine,
    /// Dot product.
    Dot,
    /// Euclidean distance.
    Euclid,
}

/// A sparse vector: parallel arrays of dimension index and weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    /// Non-zero dimension indices.
    pub indices: Vec<u32>,
    /// Weights, one per index, same length as `indices`.
    pub values: Vec<f32>,
}

impl SparseVector {
    /// `true` if this vector carries no non-zero entries. A zero-norm
    /// sparse vector is a valid, empty result.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// One point stored in a collection: a record's embedding plus payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPoint {
    /// Point id — the owning record's id.
    pub id: String,
    /// Dense embedding, fixed dimension per deployment.
    pub dense: Vec<f32>,
    /// Optional parallel sparse embedding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse: Option<SparseVector>,
    /// Payload: domain, tags, labels, tenant, content hash, importance,
    /// memory layer, and layer versioning fields.
    pub payload: BTreeMap<String, serde_json::Value>,
}

/// A hybrid search request.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Dense query vector.
    pub dense: Vec<f32>,
    /// Optional sparse query vector, for hybrid/sparse search.
    pub sparse: Option<SparseVector>,
    /// Maximum points to return.
    pub limit: usize,
    /// Minimum score to include, applied for pure semantic queries.
    pub score_threshold: Option<f32>,
    /// `must`-AND filters.
    pub filters: Vec<RecordFilter>,
    /// Whether to include payload in results.
    pub with_payload: bool,
    /// Whether to include the stored vector in results.
    pub with_vector: bool,
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Point id.
    pub id: String,
    /// Similarity score under the collection's configured distance.
    pub score: f32,
    /// Payload, present iff `with_payload` was requested.
    #[serde(default)]
    pub payload: BTreeMap<String, serde_json::Value>,
    /// Stored dense vector, present iff `with_vector` was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

/// One page of a `scroll` cursor walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollPage {
    /// Points in this page.
    pub points: Vec<SearchHit>,
    /// Offset to pass to the next `scroll` call, if more points remain.
    pub next_offset: Option<usize>,
}

/// The C2 external collaborator contract.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// `true` iff the named collection exists.
    async fn get_collection(&self, name: &str) -> MemoryResult<bool>;

    /// Create a collection with the given dense dimension and distance
    /// metric. Idempotent if the collection already exists with the same
    /// shape.
    async fn create_collection(&self, name: &str, vector_size: usize, distance: Distance) -> MemoryResult<()>;

    /// Insert or overwrite points by id.
    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> MemoryResult<()>;

    /// Hybrid or dense-only search, depending on whether `request.sparse`
    /// is populated.
    async fn search(&self, collection: &str, request: SearchRequest) -> MemoryResult<Vec<SearchHit>>;

    /// Walk every point in a collection, paginated.
    async fn scroll(
        &self,
        collection: &str,
        limit: usize,
        offset: Option<usize>,
        with_payload: bool,
        with_vectors: bool,
    ) -> MemoryResult<ScrollPage>;

    /// Replace the payload of the named points, leaving vectors untouched.
    async fn set_payload(
        &self,
        collection: &str,
        points: &[String],
        payload: BTreeMap<String, serde_json::Value>,
    ) -> MemoryResult<()>;

    /// Remove the named points.
    async fn delete(&self, collection: &str, points: &[String]) -> MemoryResult<()>;

    /// Total number of points in a collection.
    async fn count(&self, collection: &str) -> MemoryResult<usize>;

    /// Liveness probe used by the retrieval pipeline's cached health check.
    async fn health(&self) -> MemoryResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sparse_vector_is_empty() {
        assert!(SparseVector::default().is_empty());
        let sv = SparseVector {
            indices: vec![1],
            values: vec![0.5],
        };
        assert!(!sv.is_empty());
    }
}
