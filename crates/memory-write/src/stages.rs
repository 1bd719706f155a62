// SPDX-License-Identifier: MIT OR Apache-2.0
//! The three write stages: prepare, persist, index.

use std::sync::Arc;

use async_trait::async_trait;
use memory_core::{scrub, Clock, MemoryLayer, MemoryRecord};
use memory_embed::EmbeddingProvider;
use memory_error::{MemoryError, MemoryResult};
use memory_record_store::RecordStore;
use memory_vector_store::{VectorPoint, VectorStore};

use crate::context::WriteContext;
use crate::id_factory::IdFactory;

/// A single stage of the write workflow.
///
/// Every stage but [`IndexStage`] short-circuits the workflow on error;
/// `IndexStage`'s failure is caught by [`crate::workflow::WriteWorkflow::run_store`]
/// and converted into `vector_indexed = false` instead.
#[async_trait]
pub trait WriteStage: Send + Sync {
    /// Process (and mutate) the context.
    async fn process(&self, ctx: &mut WriteContext) -> MemoryResult<()>;

    /// Human-readable name used in tracing output.
    fn name(&self) -> &str;
}

/// Draws a fresh id, reads the clock, and normalizes the caller's input
/// into a [`MemoryRecord`].
pub struct PrepareStage {
    id_factory: Arc<dyn IdFactory>,
    clock: Arc<dyn Clock>,
}

impl PrepareStage {
    /// Construct a prepare stage from its collaborators.
    #[must_use]
    pub fn new(id_factory: Arc<dyn IdFactory>, clock: Arc<dyn Clock>) -> Self {
        Self { id_factory, clock }
    }
}

#[async_trait]
impl WriteStage for PrepareStage {
    async fn process(&self, ctx: &mut WriteContext) -> MemoryResult<()> {
        let input = ctx
            .input
            .take()
            .ok_or_else(|| MemoryError::internal("prepare stage ran twice"))?;
        let id = self.id_factory.next_id();
        let now = self.clock.now();
        ctx.record = Some(MemoryRecord::from_new(input, id, now));
        Ok(())
    }

    fn name(&self) -> &str {
        "prepare"
    }
}

/// Writes the prepared record to the C1 record store.
pub struct PersistStage {
    record_store: Arc<dyn RecordStore>,
}

impl PersistStage {
    /// Construct a persist stage over a record store.
    #[must_use]
    pub fn new(record_store: Arc<dyn RecordStore>) -> Self {
        Self { record_store }
    }
}

#[async_trait]
impl WriteStage for PersistStage {
    async fn process(&self, ctx: &mut WriteContext) -> MemoryResult<()> {
        let record = ctx
            .record
            .as_ref()
            .ok_or_else(|| MemoryError::internal("persist stage ran before prepare"))?
            .clone();
        self.record_store.insert(record).await
    }

    fn name(&self) -> &str {
        "persist"
    }
}

/// Requests embedding and vector upsert. Never propagates a failure: the
/// caller (see [`crate::workflow::WriteWorkflow::run_store`]) treats this
/// stage's errors as non-fatal.
pub struct IndexStage {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    record_store: Arc<dyn RecordStore>,
    collection: String,
}

impl IndexStage {
    /// Construct an index stage over its collaborators and target
    /// collection name.
    #[must_use]
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        record_store: Arc<dyn RecordStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            vector_store,
            embedder,
            record_store,
            collection: collection.into(),
        }
    }

    fn build_payload(record: &MemoryRecord) -> std::collections::BTreeMap<String, serde_json::Value> {
        let mut payload = std::collections::BTreeMap::new();
        payload.insert("id".to_string(), serde_json::json!(record.id));
        if let Some(domain) = &record.domain {
            payload.insert("domain".to_string(), serde_json::json!(domain));
        }
        payload.insert("tags".to_string(), serde_json::json!(record.tags));
        if let Some(labels) = record.metadata.get("labels") {
            payload.insert("labels".to_string(), labels.clone());
        }
        if let Some(tenant) = record.tenant() {
            payload.insert("tenant".to_string(), serde_json::json!(tenant));
        }
        if let Some(source_uri) = record.metadata.get("source_uri") {
            payload.insert("source_uri".to_string(), source_uri.clone());
        }
        if let Some(hash) = record.content_hash() {
            payload.insert("content_sha".to_string(), serde_json::json!(hash));
        }
        payload.insert("created_at".to_string(), serde_json::json!(record.created_at.timestamp_millis()));
        payload.insert("updated_at".to_string(), serde_json::json!(record.updated_at.timestamp_millis()));
        payload.insert("importance".to_string(), serde_json::json!(record.importance));
        let layer = match record.memory_layer() {
            MemoryLayer::Semantic => "semantic",
            MemoryLayer::LongTerm => "long_term",
        };
        payload.insert("memory_layer".to_string(), serde_json::json!(layer));
        payload.insert("memory_layer_version".to_string(), serde_json::json!(1));
        payload.insert(
            "memory_layer_updated_at".to_string(),
            serde_json::json!(record.updated_at.timestamp_millis()),
        );
        payload
    }
}

#[async_trait]
impl WriteStage for IndexStage {
    async fn process(&self, ctx: &mut WriteContext) -> MemoryResult<()> {
        let record = ctx
            .record
            .as_ref()
            .ok_or_else(|| MemoryError::internal("index stage ran before prepare"))?
            .clone();

        let scrubbed = scrub(&record.content);
        let dense = self.embedder.embed_dense(&scrubbed).await?;
        let sparse = self.embedder.embed_sparse(&scrubbed).await?;
        let sparse = if sparse.is_empty() { None } else { Some(sparse) };

        let point = VectorPoint {
            id: record.id.clone(),
            dense,
            sparse,
            payload: Self::build_payload(&record),
        };

        self.vector_store.upsert(&self.collection, vec![point]).await?;
        self.record_store.set_vector_indexed(&record.id, true).await?;
        ctx.vector_indexed = true;
        Ok(())
    }

    fn name(&self) -> &str {
        "index"
    }
}
