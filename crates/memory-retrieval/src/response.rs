// SPDX-License-Identifier: MIT OR Apache-2.0
//! The query response: sources, answer, graph summary, citations.

use chrono::{DateTime, Utc};

/// How a source's score was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// Pure full-text match (C2 unhealthy or a keyword-only request).
    Keyword,
    /// Pure vector similarity match.
    Semantic,
    /// `hybrid_weight`-blended semantic + keyword match.
    Hybrid,
}

/// One assembled, ranked source.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// Record id the chunk belongs to.
    pub record_id: String,
    /// File path.
    pub path: String,
    /// Inclusive line range, if known.
    pub line_range: Option<(u32, u32)>,
    /// Chunk content.
    pub content: String,
    /// Final ranking score (hybrid-blended when applicable).
    pub score: f32,
    /// How the score was produced.
    pub match_type: MatchType,
    /// `true` if this source was reached via graph expansion rather
    /// than being a direct seed hit.
    pub via_expansion: bool,
    /// Owning node's type, when the source came through the graph.
    pub node_type: Option<memory_core::NodeType>,
}

/// A formatted citation for one [`Source`].
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    /// File path.
    pub path: String,
    /// Inclusive line range, if both ends are present.
    pub lines: Option<(u32, u32)>,
    /// Owning node's type, when known.
    pub node_type: Option<memory_core::NodeType>,
    /// The source's ranking score.
    pub relevance_score: f32,
    /// Whether the source has been acknowledged by the vector index.
    pub vector_indexed: bool,
}

/// Counts describing the graph traversal performed to assemble context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphContext {
    /// Number of focus nodes lifted from seed hits.
    pub focus_nodes: usize,
    /// Number of distinct neighbor nodes reached by expansion.
    pub expanded_nodes: usize,
    /// Total chunks in the assembled context.
    pub total_chunks: usize,
    /// Number of edges traversed during expansion.
    pub edges_traversed: usize,
}

/// Metadata describing how a query ran.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMetadata {
    /// Wall-clock duration of the whole query.
    pub duration_ms: u64,
    /// Instant the query completed.
    pub timestamp: DateTime<Utc>,
    /// `true` if the pipeline degraded to keyword-only search.
    pub degraded_to_keyword: bool,
    /// Identifies the engine that produced this result.
    pub source: &'static str,
}

/// The full result of a `query` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    /// Query id assigned at admission.
    pub query_id: String,
    /// Assembled, ranked sources.
    pub sources: Vec<Source>,
    /// The top source's content verbatim, if any source was found.
    pub answer: Option<String>,
    /// Graph traversal summary.
    pub graph_context: GraphContext,
    /// Query metadata.
    pub metadata: ResultMetadata,
    /// One citation per source, present iff the request asked for them.
    pub citations: Option<Vec<Citation>>,
}

impl RetrievalResult {
    /// Build a citation list from `sources`, in source order.
    #[must_use]
    pub fn citations_for(sources: &[Source]) -> Vec<Citation> {
        sources
            .iter()
            .map(|s| Citation {
                path: s.path.clone(),
                lines: s.line_range,
                node_type: s.node_type,
                relevance_score: s.score,
                vector_indexed: true,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(path: &str, score: f32) -> Source {
        Source {
            record_id: "r1".into(),
            path: path.into(),
            line_range: Some((1, 2)),
            content: "hi".into(),
            score,
            match_type: MatchType::Hybrid,
            via_expansion: false,
            node_type: None,
        }
    }

    #[test]
    fn citations_for_preserves_order_and_fields() {
        let sources = vec![source("a.rs", 0.9), source("b.rs", 0.4)];
        let citations = RetrievalResult::citations_for(&sources);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].path, "a.rs");
        assert_eq!(citations[0].relevance_score, 0.9);
        assert_eq!(citations[0].lines, Some((1, 2)));
    }
}
