// SPDX-License-Identifier: MIT OR Apache-2.0
//! The C4 embedding-provider contract.

use async_trait::async_trait;
use memory_error::MemoryResult;
use memory_vector_store::SparseVector;

/// Dense and sparse embedding functions over text. Dimensions are fixed
/// per deployment.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// The fixed dense dimension this provider produces.
    fn dense_dimension(&self) -> usize;

    /// Embed `text` into a dense vector of [`Self::dense_dimension`] length.
    async fn embed_dense(&self, text: &str) -> MemoryResult<Vec<f32>>;

    /// Embed `text` into a sparse vector. A zero-norm (empty) result is
    /// valid.
    async fn embed_sparse(&self, text: &str) -> MemoryResult<SparseVector>;
}
