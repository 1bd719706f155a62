// SPDX-License-Identifier: MIT OR Apache-2.0
//! The nine-stage retrieval pipeline: admission, seed search, graph lift
//! and expansion, context assembly, hybrid scoring, and emission.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use memory_core::{scrub, ChunkReference, Clock, Node};
use memory_embed::EmbeddingProvider;
use memory_error::{MemoryError, MemoryResult};
use memory_graph_store::{GraphStore, MAX_BATCH_SIZE};
use memory_record_store::RecordStore;
use memory_vector_store::{SearchRequest, VectorStore};
use tracing::debug;

use crate::config::RetrievalConfig;
use crate::health::HealthCache;
use crate::request::{QueryRequest, SearchType};
use crate::response::{GraphContext, MatchType, ResultMetadata, RetrievalResult, Source};
use crate::slot::Admission;
use crate::stage::QueryStage;

const RESULT_SOURCE: &str = "memory-retrieval";

/// A seed hit prior to graph lift, carrying enough to compute a final score.
#[derive(Debug, Clone)]
struct Seed {
    record_id: String,
    score: f32,
    match_type: MatchType,
}

/// Wires C1, C2, C3, and C4 behind admission control and a cached health
/// check to answer [`QueryRequest`]s.
pub struct RetrievalPipeline {
    record_store: Arc<dyn RecordStore>,
    vector_store: Arc<dyn VectorStore>,
    graph_store: Arc<dyn GraphStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    clock: Arc<dyn Clock>,
    admission: Admission,
    health: HealthCache,
    collection: String,
    config: RetrievalConfig,
}

impl RetrievalPipeline {
    /// Construct a pipeline over its four external collaborators.
    #[must_use]
    pub fn new(
        record_store: Arc<dyn RecordStore>,
        vector_store: Arc<dyn VectorStore>,
        graph_store: Arc<dyn GraphStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        clock: Arc<dyn Clock>,
        collection: impl Into<String>,
        config: RetrievalConfig,
    ) -> Self {
        let admission = Admission::new(config.limits.max_concurrent_queries);
        let health = HealthCache::new(Arc::clone(&vector_store), Arc::clone(&clock));
        Self {
            record_store,
            vector_store,
            graph_store,
            embedder,
            clock,
            admission,
            health,
            collection: collection.into(),
            config,
        }
    }

    /// Run the full retrieval pipeline for one request.
    ///
    /// # Errors
    ///
    /// Fails with `Validation` if every admission slot is in use, if the
    /// request carries no scoping filter, or if the query exceeds
    /// `limits.query_timeout_ms`; with `Internal` if the embedding backend
    /// is unreachable for a semantic or hybrid request.
    pub async fn query(&self, request: QueryRequest) -> MemoryResult<RetrievalResult> {
        let started_at = self.clock.now();
        let _slot = self.admission.try_reserve()?;
        let query_id = uuid::Uuid::new_v4().to_string();
        debug!(target: "memory.retrieval", query_id, stage = QueryStage::Reserved.as_str(), "admitted");

        if !request.has_scoping_filter() {
            return Err(MemoryError::validation(
                "a query must carry at least one scoping filter (domain, tags, tenant, or labels)",
            ));
        }

        let timeout = StdDuration::from_millis(self.config.limits.query_timeout_ms);
        let result = tokio::time::timeout(timeout, self.run_stages(&query_id, &request)).await;

        let (sources, graph_context, degraded_to_keyword) = match result {
            Ok(inner) => inner?,
            Err(_) => return Err(MemoryError::timeout("query exceeded its configured deadline")),
        };

        debug!(target: "memory.retrieval", query_id, stage = QueryStage::Cited.as_str(), "assembled");

        let citations = request
            .include_citations
            .then(|| RetrievalResult::citations_for(&sources));
        let answer = sources.first().map(|s| s.content.clone());
        let finished_at = self.clock.now();

        debug!(target: "memory.retrieval", query_id, stage = QueryStage::Released.as_str(), "released");

        Ok(RetrievalResult {
            query_id,
            sources,
            answer,
            graph_context,
            metadata: ResultMetadata {
                duration_ms: finished_at
                    .signed_duration_since(started_at)
                    .num_milliseconds()
                    .max(0) as u64,
                timestamp: finished_at,
                degraded_to_keyword,
                source: RESULT_SOURCE,
            },
            citations,
        })
    }

    /// Stages 3 through 8: seed search through context assembly and
    /// hybrid scoring. Split out so the whole span can be wrapped in a
    /// single timeout.
    async fn run_stages(
        &self,
        query_id: &str,
        request: &QueryRequest,
    ) -> MemoryResult<(Vec<Source>, GraphContext, bool)> {
        let filters = request.record_filters();
        let (seeds, degraded_to_keyword) = self.search_seeds(request, &filters).await?;
        debug!(target: "memory.retrieval", query_id, stage = QueryStage::Searched.as_str(), seeds = seeds.len());

        if seeds.is_empty() {
            return Ok((Vec::new(), GraphContext::default(), degraded_to_keyword));
        }

        let seed_ids: Vec<String> = seeds.iter().map(|s| s.record_id.clone()).collect();
        let seed_scores: HashMap<String, &Seed> =
            seeds.iter().map(|s| (s.record_id.clone(), s)).collect();

        let focus_chunks = self.lift_to_graph(&seed_ids).await?;
        let focus_node_ids: Vec<String> = {
            let mut seen = HashSet::new();
            focus_chunks
                .iter()
                .filter(|c| seen.insert(c.node_id.clone()))
                .map(|c| c.node_id.clone())
                .collect()
        };
        debug!(target: "memory.retrieval", query_id, stage = QueryStage::Lifted.as_str(), focus = focus_node_ids.len());

        let (expanded_node_ids, edges_traversed) = self.expand(&focus_node_ids).await?;
        debug!(target: "memory.retrieval", query_id, stage = QueryStage::Expanded.as_str(), expanded = expanded_node_ids.len());

        let mut all_node_ids = focus_node_ids.clone();
        for id in &expanded_node_ids {
            if !all_node_ids.contains(id) {
                all_node_ids.push(id.clone());
            }
        }

        let max_chunks = request
            .max_chunks
            .unwrap_or(self.config.limits.max_context_chunks)
            .min(self.config.limits.max_context_chunks);

        let sources = self
            .assemble_context(&all_node_ids, &focus_node_ids, &seed_scores, request, max_chunks)
            .await?;
        debug!(target: "memory.retrieval", query_id, stage = QueryStage::Assembled.as_str(), sources = sources.len());

        let graph_context = GraphContext {
            focus_nodes: focus_node_ids.len(),
            expanded_nodes: expanded_node_ids.len(),
            total_chunks: sources.len(),
            edges_traversed,
        };

        let sources = if matches!(request.search_type, SearchType::Hybrid) {
            self.hybrid_rescore(sources, request, &filters).await?
        } else {
            sources
        };

        Ok((sources, graph_context, degraded_to_keyword))
    }

    /// Stage 3: produce seed hits, degrading to FTS when the vector store
    /// is unhealthy or the request is keyword-only. Returns whether the
    /// pipeline degraded to keyword-only search.
    async fn search_seeds(
        &self,
        request: &QueryRequest,
        filters: &[memory_record_store::RecordFilter],
    ) -> MemoryResult<(Vec<Seed>, bool)> {
        let wants_vector = matches!(request.search_type, SearchType::Semantic | SearchType::Hybrid);
        let vector_healthy = wants_vector && self.health.is_healthy().await;

        if vector_healthy {
            let scrubbed = scrub(&request.question);
            let dense = self.embedder.embed_dense(&scrubbed).await.map_err(|_| {
                MemoryError::internal("Embedding backend not configured")
            })?;
            let sparse = self.embedder.embed_sparse(&scrubbed).await.ok().filter(|s| !s.is_empty());

            let score_threshold = match request.search_type {
                SearchType::Semantic => {
                    Some(request.score_threshold.unwrap_or(self.config.default_threshold))
                }
                _ => None,
            };

            let search_request = SearchRequest {
                dense,
                sparse,
                limit: request.k + request.offset,
                score_threshold,
                filters: filters.to_vec(),
                with_payload: true,
                with_vector: false,
            };

            let hits = self.vector_store.search(&self.collection, search_request).await?;
            let match_type = if matches!(request.search_type, SearchType::Hybrid) {
                MatchType::Hybrid
            } else {
                MatchType::Semantic
            };
            let seeds = hits
                .into_iter()
                .skip(request.offset)
                .map(|hit| Seed {
                    record_id: hit.id,
                    score: hit.score,
                    match_type,
                })
                .collect();
            Ok((seeds, false))
        } else {
            let records = self
                .record_store
                .search_fts(&request.question, filters, request.k + request.offset)
                .await?;
            let seeds = records
                .into_iter()
                .skip(request.offset)
                .map(|record| Seed {
                    record_id: record.id,
                    score: 1.0,
                    match_type: MatchType::Keyword,
                })
                .collect();
            Ok((seeds, true))
        }
    }

    /// Stage 5: lift seed record ids to chunk references, in batches of at
    /// most [`MAX_BATCH_SIZE`].
    async fn lift_to_graph(&self, seed_ids: &[String]) -> MemoryResult<Vec<ChunkReference>> {
        let mut chunks = Vec::new();
        for batch in seed_ids.chunks(MAX_BATCH_SIZE) {
            chunks.extend(self.graph_store.find_chunks_by_vector_ids(batch).await?);
        }
        Ok(chunks)
    }

    /// Stage 6: whitelist-filtered, weight-ordered neighbor expansion, up
    /// to `expansion.max_hops` rounds. Returns the distinct neighbor node
    /// ids reached and the total number of edges traversed.
    async fn expand(&self, focus_node_ids: &[String]) -> MemoryResult<(Vec<String>, usize)> {
        let mut visited: HashSet<String> = focus_node_ids.iter().cloned().collect();
        let mut frontier: Vec<String> = focus_node_ids.to_vec();
        let mut expanded = Vec::new();
        let mut edges_traversed = 0usize;

        for _ in 0..self.config.expansion.max_hops.max(1) {
            if frontier.is_empty() {
                break;
            }
            let take = self.config.expansion.max_neighbors_per_node * frontier.len();
            let edges = self
                .graph_store
                .find_edges(&self.config.expansion.allowed_edges, &frontier, true, take)
                .await?;
            edges_traversed += edges.len();

            let mut next_frontier = Vec::new();
            for edge in &edges {
                for candidate in [&edge.src_id, &edge.dst_id] {
                    if !visited.contains(candidate) {
                        visited.insert(candidate.clone());
                        expanded.push(candidate.clone());
                        next_frontier.push(candidate.clone());
                    }
                }
            }
            frontier = next_frontier;
        }

        Ok((expanded, edges_traversed))
    }

    /// Stage 7: fetch chunks for every focus and expanded node, sort by
    /// `(node type priority, seed score)` descending, dedup by
    /// [`ChunkReference::dedup_key`], and cap at `max_chunks`.
    async fn assemble_context(
        &self,
        all_node_ids: &[String],
        focus_node_ids: &[String],
        seed_scores: &HashMap<String, &Seed>,
        request: &QueryRequest,
        max_chunks: usize,
    ) -> MemoryResult<Vec<Source>> {
        let focus_set: HashSet<&String> = focus_node_ids.iter().collect();
        let mut chunk_node_pairs: Vec<(ChunkReference, Node)> = Vec::new();
        for batch in all_node_ids.chunks(MAX_BATCH_SIZE) {
            chunk_node_pairs.extend(self.graph_store.find_chunks_by_node_ids(batch).await?);
        }

        let mut ranked: Vec<(f32, ChunkReference, Node)> = chunk_node_pairs
            .into_iter()
            .map(|(chunk, node)| {
                let score = seed_scores
                    .get(&chunk.vector_store_id)
                    .map_or(0.0, |seed| seed.score);
                (score, chunk, node)
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.2.node_type
                .priority()
                .cmp(&a.2.node_type.priority())
                .then(b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut seen_keys = HashSet::new();
        let mut sources = Vec::new();
        for (score, chunk, node) in ranked {
            if sources.len() >= max_chunks {
                break;
            }
            if !seen_keys.insert(chunk.dedup_key()) {
                continue;
            }
            let Some(record) = self.record_store.get(&chunk.vector_store_id).await? else {
                continue;
            };
            let via_expansion = !focus_set.contains(&chunk.node_id);
            let match_type = seed_scores
                .get(&chunk.vector_store_id)
                .map_or(MatchType::Keyword, |seed| seed.match_type);
            sources.push(Source {
                record_id: record.id,
                path: chunk.path,
                line_range: chunk.line_range,
                content: record.content,
                score,
                match_type: if matches!(request.search_type, SearchType::Hybrid) {
                    MatchType::Hybrid
                } else {
                    match_type
                },
                via_expansion,
                node_type: Some(node.node_type),
            });
        }
        Ok(sources)
    }

    /// Stage 8: blend each source's semantic score with a binary keyword
    /// match (1.0 if the source's record also matches an independent FTS
    /// query, else 0.0), then re-sort by the blended score descending.
    async fn hybrid_rescore(
        &self,
        mut sources: Vec<Source>,
        request: &QueryRequest,
        filters: &[memory_record_store::RecordFilter],
    ) -> MemoryResult<Vec<Source>> {
        let keyword_matches: HashSet<String> = self
            .record_store
            .search_fts(&request.question, filters, sources.len().max(request.k))
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();

        let alpha = self.config.hybrid_weight as f32;
        for source in &mut sources {
            let fts_score = if keyword_matches.contains(&source.record_id) {
                1.0
            } else {
                0.0
            };
            source.score = alpha * source.score + (1.0 - alpha) * fts_score;
            source.match_type = MatchType::Hybrid;
        }
        sources.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(sources)
    }
}
