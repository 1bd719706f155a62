// SPDX-License-Identifier: MIT OR Apache-2.0
//! An in-process [`MemoryProvider`] wiring the in-memory C1/C2/C3 adapters
//! and the deterministic mock embedder behind C5/C6/C7/C8.

use std::sync::Arc;

use async_trait::async_trait;
use memory_checkpoint::{BranchRequest, BranchResult, CheckpointEngine, CheckpointPolicy, NewCheckpoint, SaveOptions};
use memory_config::MemoryConfig;
use memory_core::{Checkpoint, Clock, NewMemoryRecord, SystemClock};
use memory_embed::{DeterministicMockEmbedder, EmbeddingProvider};
use memory_error::MemoryResult;
use memory_graph_store::{GraphStore, InMemoryGraphStore};
use memory_record_store::{CheckpointStore, InMemoryRecordStore, RecordStore};
use memory_retrieval::{QueryRequest, RetrievalConfig, RetrievalLimits, RetrievalPipeline, RetrievalResult};
use memory_shortterm::{FlushResult, ShortTermMemory, ShortTermPolicy, StoreRequest, StoreResult};
use memory_vector_store::{Distance, InMemoryVectorStore, VectorStore};
use memory_write::{IdFactory, UuidIdFactory, WriteOutcome, WriteWorkflow};

use crate::MemoryProvider;

/// Wires in-memory C1/C2/C3 adapters and a deterministic mock embedder
/// behind the four component crates, for tests and single-process
/// deployments.
pub struct LocalMemoryProvider {
    write_workflow: Arc<WriteWorkflow>,
    short_term: Arc<ShortTermMemory>,
    checkpoints: Arc<CheckpointEngine>,
    retrieval: RetrievalPipeline,
}

impl LocalMemoryProvider {
    /// Construct a provider from a validated [`MemoryConfig`], creating the
    /// configured vector-store collection.
    ///
    /// # Errors
    ///
    /// Propagates whatever [`VectorStore::create_collection`] returns.
    pub async fn new(config: &MemoryConfig) -> MemoryResult<Self> {
        let record_store = Arc::new(InMemoryRecordStore::new());
        let vector_store = Arc::new(InMemoryVectorStore::new());
        let graph_store = Arc::new(InMemoryGraphStore::new());
        let embedder = Arc::new(DeterministicMockEmbedder::new(config.vector_store.embed_dim));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let distance = match config.vector_store.similarity.as_str() {
            "dot" => Distance::Dot,
            "euclid" => Distance::Euclid,
            _ => Distance::Cosine,
        };
        vector_store
            .create_collection(&config.vector_store.collection, config.vector_store.embed_dim, distance)
            .await?;

        let write_workflow = Arc::new(WriteWorkflow::new(
            record_store.clone() as Arc<dyn RecordStore>,
            vector_store.clone() as Arc<dyn VectorStore>,
            embedder.clone() as Arc<dyn EmbeddingProvider>,
            config.vector_store.collection.clone(),
        ));

        let checkpoints = Arc::new(CheckpointEngine::new(
            record_store.clone() as Arc<dyn CheckpointStore>,
            clock.clone(),
            CheckpointPolicy {
                max_retained: config.checkpoint.max_retained,
                ttl: chrono::Duration::milliseconds(i64::try_from(config.checkpoint.ttl_ms).unwrap_or(i64::MAX)),
                branch_budget: config.checkpoint.branch_budget,
            },
        ));

        let short_term = Arc::new(ShortTermMemory::new(
            clock.clone(),
            Arc::new(UuidIdFactory) as Arc<dyn IdFactory>,
            write_workflow.clone(),
            checkpoints.clone(),
            ShortTermPolicy {
                ttl: chrono::Duration::milliseconds(i64::try_from(config.short_term.ttl_ms).unwrap_or(i64::MAX)),
                promotion_importance: config.short_term.promotion_importance,
            },
        ));

        let retrieval_config = RetrievalConfig {
            limits: RetrievalLimits {
                max_concurrent_queries: config.limits.max_concurrent_queries,
                max_context_chunks: config.limits.max_context_chunks,
                query_timeout_ms: config.limits.query_timeout_ms,
            },
            hybrid_weight: config.hybrid_weight,
            default_threshold: config.default_threshold,
            ..RetrievalConfig::default()
        };
        let retrieval = RetrievalPipeline::new(
            record_store as Arc<dyn RecordStore>,
            vector_store as Arc<dyn VectorStore>,
            graph_store as Arc<dyn GraphStore>,
            embedder as Arc<dyn EmbeddingProvider>,
            clock,
            config.vector_store.collection.clone(),
            retrieval_config,
        );

        Ok(Self {
            write_workflow,
            short_term,
            checkpoints,
            retrieval,
        })
    }
}

#[async_trait]
impl MemoryProvider for LocalMemoryProvider {
    async fn store(&self, record: NewMemoryRecord) -> MemoryResult<WriteOutcome> {
        self.write_workflow.run_store(record).await
    }

    async fn store_short_term(&self, request: StoreRequest) -> MemoryResult<StoreResult> {
        self.short_term.store(request).await
    }

    async fn flush_expired_short_term(&self) -> MemoryResult<FlushResult> {
        self.short_term.flush_expired().await
    }

    async fn save_checkpoint(&self, new: NewCheckpoint, options: SaveOptions) -> MemoryResult<Checkpoint> {
        self.checkpoints.save(new, options).await
    }

    async fn rollback(&self, id: &str) -> MemoryResult<Checkpoint> {
        self.checkpoints.rollback(id).await
    }

    async fn branch(&self, request: BranchRequest) -> MemoryResult<BranchResult> {
        self.checkpoints.branch(request).await
    }

    async fn query(&self, request: QueryRequest) -> MemoryResult<RetrievalResult> {
        self.retrieval.query(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_persists_a_record_through_the_wired_workflow() {
        let provider = LocalMemoryProvider::new(&MemoryConfig::default()).await.unwrap();
        let outcome = provider.store(NewMemoryRecord::new("hello there")).await.unwrap();
        assert!(!outcome.id.is_empty());
    }

    #[tokio::test]
    async fn save_and_rollback_a_checkpoint_through_the_provider() {
        let provider = LocalMemoryProvider::new(&MemoryConfig::default()).await.unwrap();
        let saved = provider
            .save_checkpoint(
                NewCheckpoint::new("cp-1", serde_json::json!({"scratch": {}})),
                SaveOptions::default(),
            )
            .await
            .unwrap();
        let restored = provider.rollback(&saved.id).await.unwrap();
        assert_eq!(restored.id, saved.id);
    }

    #[tokio::test]
    async fn query_without_scoping_filter_is_rejected_through_the_provider() {
        let provider = LocalMemoryProvider::new(&MemoryConfig::default()).await.unwrap();
        let err = provider.query(QueryRequest::new("anything")).await.unwrap_err();
        assert_eq!(err.kind, memory_error::MemoryErrorKind::Validation);
    }

    #[tokio::test]
    async fn store_short_term_round_trips_through_the_session_map() {
        let provider = LocalMemoryProvider::new(&MemoryConfig::default()).await.unwrap();
        let result = provider
            .store_short_term(StoreRequest::new("session-1", "note to self"))
            .await
            .unwrap();
        assert_eq!(result.session_id, "session-1");
        assert_eq!(result.layer, "short_term");
    }
}
