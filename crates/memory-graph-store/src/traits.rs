// SPDX-License-Identifier: MIT OR Apache-2.0
//! The C3 graph-store contract.

use async_trait::async_trait;
use memory_core::{ChunkReference, Edge, EdgeType, Node};
use memory_error::{MemoryError, MemoryResult};

/// Maximum ids accepted by a single batched lookup, to avoid
/// parameter-explosion against the backing store.
pub const MAX_BATCH_SIZE: usize = 500;

/// Validate a batch of ids against [`MAX_BATCH_SIZE`].
///
/// # Errors
///
/// Returns `Validation` if `ids.len() > MAX_BATCH_SIZE`.
pub fn check_batch_size(ids: &[String]) -> MemoryResult<()> {
    if ids.len() > MAX_BATCH_SIZE {
        return Err(MemoryError::validation(format!(
            "batch of {} ids exceeds the maximum of {MAX_BATCH_SIZE}",
            ids.len()
        )));
    }
    Ok(())
}

/// The C3 external collaborator contract.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Look up chunk references by owning vector-store point id, in
    /// batches of at most [`MAX_BATCH_SIZE`].
    async fn find_chunks_by_vector_ids(&self, ids: &[String]) -> MemoryResult<Vec<ChunkReference>>;

    /// Look up chunk references (with their owning node) by node id, in
    /// batches of at most [`MAX_BATCH_SIZE`].
    async fn find_chunks_by_node_ids(&self, ids: &[String]) -> MemoryResult<Vec<(ChunkReference, Node)>>;

    /// Find edges of the given types touching any of `endpoint_ids` as
    /// either source or destination, optionally ordered by weight
    /// descending, capped at `take`.
    async fn find_edges(
        &self,
        types: &[EdgeType],
        endpoint_ids: &[String],
        order_by_weight_desc: bool,
        take: usize,
    ) -> MemoryResult<Vec<Edge>>;

    /// Look up nodes by id, in batches of at most [`MAX_BATCH_SIZE`].
    async fn find_nodes(&self, ids: &[String]) -> MemoryResult<Vec<Node>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_within_limit_is_ok() {
        let ids: Vec<String> = (0..MAX_BATCH_SIZE).map(|i| i.to_string()).collect();
        assert!(check_batch_size(&ids).is_ok());
    }

    #[test]
    fn batch_size_over_limit_is_validation_error() {
        let ids: Vec<String> = (0..=MAX_BATCH_SIZE).map(|i| i.to_string()).collect();
        let err = check_batch_size(&ids).unwrap_err();
        assert_eq!(err.kind, memory_error::MemoryErrorKind::Validation);
    }
}
