// SPDX-License-Identifier: MIT OR Apache-2.0
//! A deterministic embedding provider for tests: no model, no network,
//! same text always produces the same vectors.

use async_trait::async_trait;
use memory_error::MemoryResult;
use memory_vector_store::SparseVector;
use sha2::{Digest, Sha256};

use crate::traits::EmbeddingProvider;

/// Deterministic, hash-derived embedding provider.
///
/// Dense vectors are produced by repeatedly hashing `text` with a rolling
/// counter and mapping each hash's bytes to `[-1.0, 1.0]`. Sparse vectors
/// select up to 8 word-hash-derived indices from a fixed-size vocabulary.
pub struct DeterministicMockEmbedder {
    dense_dimension: usize,
    sparse_vocab_size: u32,
}

impl DeterministicMockEmbedder {
    /// Construct a mock embedder with the given dense dimension.
    #[must_use]
    pub fn new(dense_dimension: usize) -> Self {
        Self {
            dense_dimension,
            sparse_vocab_size: 4096,
        }
    }
}

impl Default for DeterministicMockEmbedder {
    fn default() -> Self {
        Self::new(16)
    }
}

#[async_trait]
impl EmbeddingProvider for DeterministicMockEmbedder {
    fn dense_dimension(&self) -> usize {
        self.dense_dimension
    }

    async fn embed_dense(&self, text: &str) -> MemoryResult<Vec<f32>> {
        let mut out = Vec::with_capacity(self.dense_dimension);
        let mut counter: u32 = 0;
        while out.len() < self.dense_dimension {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            hasher.update(counter.to_le_bytes());
            let digest = hasher.finalize();
            for byte in digest.iter() {
                if out.len() == self.dense_dimension {
                    break;
                }
                out.push((f32::from(*byte) / 127.5) - 1.0);
            }
            counter += 1;
        }
        Ok(out)
    }

    async fn embed_sparse(&self, text: &str) -> MemoryResult<SparseVector> {
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for word in text.split_whitespace().take(8) {
            let mut hasher = Sha256::new();
            hasher.update(word.as_bytes());
            let digest = hasher.finalize();
            let idx = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]) % self.sparse_vocab_size;
            if !indices.contains(&idx) {
                indices.push(idx);
                values.push(1.0);
            }
        }
        Ok(SparseVector { indices, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_produces_same_dense_vector() {
        let embedder = DeterministicMockEmbedder::new(16);
        let a = embedder.embed_dense("hello world").await.unwrap();
        let b = embedder.embed_dense("hello world").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[tokio::test]
    async fn different_text_produces_different_dense_vector() {
        let embedder = DeterministicMockEmbedder::new(16);
        let a = embedder.embed_dense("hello").await.unwrap();
        let b = embedder.embed_dense("goodbye").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn dense_vector_components_are_in_range() {
        let embedder = DeterministicMockEmbedder::new(32);
        let v = embedder.embed_dense("anything").await.unwrap();
        assert!(v.iter().all(|x| (-1.0..=1.0).contains(x)));
    }

    #[tokio::test]
    async fn empty_text_yields_empty_sparse_vector() {
        let embedder = DeterministicMockEmbedder::default();
        let sv = embedder.embed_sparse("").await.unwrap();
        assert!(sv.is_empty());
    }

    #[tokio::test]
    async fn sparse_vector_has_matching_index_and_value_lengths() {
        let embedder = DeterministicMockEmbedder::default();
        let sv = embedder.embed_sparse("alpha beta gamma").await.unwrap();
        assert_eq!(sv.indices.len(), sv.values.len());
        assert!(!sv.is_empty());
    }
}
