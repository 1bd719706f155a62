// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory `GraphStore` adapter.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use memory_core::{ChunkReference, Edge, EdgeType, Node};
use memory_error::{MemoryError, MemoryResult};

use crate::traits::{check_batch_size, GraphStore};

/// In-memory adapter backing the C3 contract.
#[derive(Default)]
pub struct InMemoryGraphStore {
    nodes: RwLock<HashMap<String, Node>>,
    edges: RwLock<HashMap<String, Edge>>,
    chunks: RwLock<HashMap<String, ChunkReference>>,
}

impl InMemoryGraphStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a node.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the node lock is poisoned.
    pub fn put_node(&self, node: Node) -> MemoryResult<()> {
        self.nodes
            .write()
            .map_err(|_| MemoryError::internal("nodes lock poisoned"))?
            .insert(node.id.clone(), node);
        Ok(())
    }

    /// Insert or overwrite an edge.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the edge lock is poisoned.
    pub fn put_edge(&self, edge: Edge) -> MemoryResult<()> {
        self.edges
            .write()
            .map_err(|_| MemoryError::internal("edges lock poisoned"))?
            .insert(edge.id.clone(), edge);
        Ok(())
    }

    /// Insert or overwrite a chunk reference.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the chunk lock is poisoned.
    pub fn put_chunk(&self, chunk: ChunkReference) -> MemoryResult<()> {
        self.chunks
            .write()
            .map_err(|_| MemoryError::internal("chunks lock poisoned"))?
            .insert(chunk.id.clone(), chunk);
        Ok(())
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn find_chunks_by_vector_ids(&self, ids: &[String]) -> MemoryResult<Vec<ChunkReference>> {
        check_batch_size(ids)?;
        let guard = self
            .chunks
            .read()
            .map_err(|_| MemoryError::internal("chunks lock poisoned"))?;
        Ok(guard
            .values()
            .filter(|c| ids.contains(&c.vector_store_id))
            .cloned()
            .collect())
    }

    async fn find_chunks_by_node_ids(&self, ids: &[String]) -> MemoryResult<Vec<(ChunkReference, Node)>> {
        check_batch_size(ids)?;
        let chunks = self
            .chunks
            .read()
            .map_err(|_| MemoryError::internal("chunks lock poisoned"))?;
        let nodes = self
            .nodes
            .read()
            .map_err(|_| MemoryError::internal("nodes lock poisoned"))?;
        Ok(chunks
            .values()
            .filter(|c| ids.contains(&c.node_id))
            .filter_map(|c| nodes.get(&c.node_id).map(|n| (c.clone(), n.clone())))
            .collect())
    }

    async fn find_edges(
        &self,
        types: &[EdgeType],
        endpoint_ids: &[String],
        order_by_weight_desc: bool,
        take: usize,
    ) -> MemoryResult<Vec<Edge>> {
        check_batch_size(endpoint_ids)?;
        let guard = self
            .edges
            .read()
            .map_err(|_| MemoryError::internal("edges lock poisoned"))?;
        let mut matched: Vec<Edge> = guard
            .values()
            .filter(|e| types.contains(&e.edge_type))
            .filter(|e| endpoint_ids.contains(&e.src_id) || endpoint_ids.contains(&e.dst_id))
            .cloned()
            .collect();
        if order_by_weight_desc {
            matched.sort_by(|a, b| {
                b.weight
                    .unwrap_or(0.0)
                    .partial_cmp(&a.weight.unwrap_or(0.0))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        matched.truncate(take);
        Ok(matched)
    }

    async fn find_nodes(&self, ids: &[String]) -> MemoryResult<Vec<Node>> {
        check_batch_size(ids)?;
        let guard = self
            .nodes
            .read()
            .map_err(|_| MemoryError::internal("nodes lock poisoned"))?;
        Ok(ids.iter().filter_map(|id| guard.get(id).cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn node(id: &str, node_type: memory_core::NodeType) -> Node {
        Node {
            id: id.to_string(),
            node_type,
            key: id.to_string(),
            label: id.to_string(),
            meta: BTreeMap::new(),
        }
    }

    fn edge(id: &str, edge_type: EdgeType, src: &str, dst: &str, weight: Option<f64>) -> Edge {
        Edge {
            id: id.to_string(),
            edge_type,
            src_id: src.to_string(),
            dst_id: dst.to_string(),
            weight,
        }
    }

    fn chunk(id: &str, node_id: &str, vector_store_id: &str) -> ChunkReference {
        ChunkReference {
            id: id.to_string(),
            node_id: node_id.to_string(),
            vector_store_id: vector_store_id.to_string(),
            path: format!("{node_id}.rs"),
            line_range: None,
            meta: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn find_chunks_by_vector_ids_filters_correctly() {
        let store = InMemoryGraphStore::new();
        store.put_chunk(chunk("c1", "n1", "v1")).unwrap();
        store.put_chunk(chunk("c2", "n2", "v2")).unwrap();
        let found = store
            .find_chunks_by_vector_ids(&["v1".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node_id, "n1");
    }

    #[tokio::test]
    async fn find_chunks_by_node_ids_joins_node() {
        let store = InMemoryGraphStore::new();
        store.put_node(node("n1", memory_core::NodeType::Doc)).unwrap();
        store.put_chunk(chunk("c1", "n1", "v1")).unwrap();
        let found = store.find_chunks_by_node_ids(&["n1".to_string()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.node_type, memory_core::NodeType::Doc);
    }

    #[tokio::test]
    async fn find_edges_filters_by_type_and_endpoint_and_orders_by_weight() {
        let store = InMemoryGraphStore::new();
        store.put_edge(edge("e1", EdgeType::Imports, "n1", "n2", Some(1.0))).unwrap();
        store.put_edge(edge("e2", EdgeType::Imports, "n1", "n3", Some(5.0))).unwrap();
        store.put_edge(edge("e3", EdgeType::DependsOn, "n1", "n4", Some(9.0))).unwrap();
        let found = store
            .find_edges(&[EdgeType::Imports], &["n1".to_string()], true, 10)
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, "e2");
    }

    #[tokio::test]
    async fn find_edges_respects_take_cap() {
        let store = InMemoryGraphStore::new();
        for i in 0..5 {
            store
                .put_edge(edge(&format!("e{i}"), EdgeType::Imports, "n1", &format!("n{i}"), None))
                .unwrap();
        }
        let found = store
            .find_edges(&[EdgeType::Imports], &["n1".to_string()], false, 2)
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn find_nodes_returns_only_existing() {
        let store = InMemoryGraphStore::new();
        store.put_node(node("n1", memory_core::NodeType::Service)).unwrap();
        let found = store
            .find_nodes(&["n1".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn batch_over_limit_is_rejected() {
        let store = InMemoryGraphStore::new();
        let ids: Vec<String> = (0..=crate::MAX_BATCH_SIZE).map(|i| i.to_string()).collect();
        let err = store.find_nodes(&ids).await.unwrap_err();
        assert_eq!(err.kind, memory_error::MemoryErrorKind::Validation);
    }
}
