// SPDX-License-Identifier: MIT OR Apache-2.0
//! Retrieval pipeline configuration.

use memory_core::{default_allowed_edges, EdgeType};

/// One-hop expansion settings.
#[derive(Debug, Clone)]
pub struct ExpansionConfig {
    /// Edge types the expansion stage is allowed to traverse.
    pub allowed_edges: Vec<EdgeType>,
    /// Number of expansion hops, `1..=3`.
    pub max_hops: u8,
    /// Maximum neighbors kept per focus node.
    pub max_neighbors_per_node: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            allowed_edges: default_allowed_edges(),
            max_hops: 1,
            max_neighbors_per_node: 20,
        }
    }
}

/// Result-size and concurrency limits.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalLimits {
    /// Maximum chunks in an assembled context.
    pub max_context_chunks: usize,
    /// Maximum queries admitted concurrently.
    pub max_concurrent_queries: usize,
    /// Per-query deadline.
    pub query_timeout_ms: u64,
}

impl Default for RetrievalLimits {
    fn default() -> Self {
        Self {
            max_context_chunks: 24,
            max_concurrent_queries: 5,
            query_timeout_ms: 30_000,
        }
    }
}

/// Top-level retrieval pipeline configuration.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Expansion settings.
    pub expansion: ExpansionConfig,
    /// Result-size and concurrency limits.
    pub limits: RetrievalLimits,
    /// Hybrid score weight α applied to the semantic component; `1 - α`
    /// weights the keyword component.
    pub hybrid_weight: f64,
    /// Default similarity score threshold for pure semantic queries.
    pub default_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            expansion: ExpansionConfig::default(),
            limits: RetrievalLimits::default(),
            hybrid_weight: 0.6,
            default_threshold: 0.5,
        }
    }
}
