// SPDX-License-Identifier: MIT OR Apache-2.0
//! The write workflow: a strictly sequential chain of [`WriteStage`]s with
//! one deliberate exception to short-circuiting.

use std::sync::Arc;

use memory_core::{Clock, NewMemoryRecord, SystemClock};
use memory_embed::EmbeddingProvider;
use memory_error::{MemoryError, MemoryResult};
use memory_record_store::RecordStore;
use memory_vector_store::VectorStore;
use tracing::{debug, warn};

use crate::context::{WriteContext, WriteOutcome};
use crate::id_factory::{IdFactory, UuidIdFactory};
use crate::stages::{IndexStage, PersistStage, PrepareStage, WriteStage};

/// The C5 write workflow: prepare → persist → index, run strictly in
/// order against one record.
pub struct WriteWorkflow {
    prepare: PrepareStage,
    persist: PersistStage,
    index: IndexStage,
}

impl WriteWorkflow {
    /// Construct the default three-stage workflow with a UUID id factory
    /// and the system clock.
    #[must_use]
    pub fn new(
        record_store: Arc<dyn RecordStore>,
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: impl Into<String>,
    ) -> Self {
        Self::with_collaborators(
            record_store,
            vector_store,
            embedder,
            collection,
            Arc::new(UuidIdFactory),
            Arc::new(SystemClock),
        )
    }

    /// Construct the workflow with an explicit id factory and clock, for
    /// deterministic tests.
    #[must_use]
    pub fn with_collaborators(
        record_store: Arc<dyn RecordStore>,
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: impl Into<String>,
        id_factory: Arc<dyn IdFactory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            prepare: PrepareStage::new(id_factory, clock),
            persist: PersistStage::new(record_store.clone()),
            index: IndexStage::new(vector_store, embedder, record_store, collection),
        }
    }

    /// Run the three stages against a single new record.
    ///
    /// # Errors
    ///
    /// Returns the prepare or persist stage's error unmodified; the index
    /// stage's error is never returned — it is logged and `vector_indexed`
    /// is left `false`.
    pub async fn run_store(&self, input: NewMemoryRecord) -> MemoryResult<WriteOutcome> {
        let mut ctx = WriteContext::new(input);

        debug!(target: "memory.write", stage = self.prepare.name(), "executing");
        self.prepare.process(&mut ctx).await?;

        debug!(target: "memory.write", stage = self.persist.name(), "executing");
        self.persist.process(&mut ctx).await?;

        debug!(target: "memory.write", stage = self.index.name(), "executing");
        if let Err(err) = self.index.process(&mut ctx).await {
            warn!(target: "memory.write", error = %err, "index stage failed, leaving vector_indexed = false");
        }

        let record = ctx
            .record
            .ok_or_else(|| MemoryError::internal("write workflow completed without a record"))?;
        Ok(WriteOutcome {
            id: record.id,
            vector_indexed: ctx.vector_indexed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_embed::DeterministicMockEmbedder;
    use memory_record_store::InMemoryRecordStore;
    use memory_vector_store::{Distance, InMemoryVectorStore};

    async fn workflow_with_collection() -> (WriteWorkflow, Arc<InMemoryRecordStore>, Arc<InMemoryVectorStore>) {
        let record_store = Arc::new(InMemoryRecordStore::new());
        let vector_store = Arc::new(InMemoryVectorStore::new());
        vector_store.create_collection("memories", 16, Distance::Cosine).await.unwrap();
        let embedder = Arc::new(DeterministicMockEmbedder::new(16));
        let workflow = WriteWorkflow::new(record_store.clone(), vector_store.clone(), embedder, "memories");
        (workflow, record_store, vector_store)
    }

    #[tokio::test]
    async fn run_store_persists_and_indexes_successfully() {
        let (workflow, record_store, _vs) = workflow_with_collection().await;
        let outcome = workflow.run_store(NewMemoryRecord::new("Secure storage record")).await.unwrap();
        assert!(outcome.vector_indexed);
        let stored = record_store.get(&outcome.id).await.unwrap().unwrap();
        assert_eq!(stored.content, "Secure storage record");
        assert!(stored.vector_indexed);
    }

    #[tokio::test]
    async fn run_store_survives_index_failure_durably() {
        let record_store = Arc::new(InMemoryRecordStore::new());
        let vector_store = Arc::new(InMemoryVectorStore::new());
        let embedder = Arc::new(DeterministicMockEmbedder::new(16));
        let workflow = WriteWorkflow::new(record_store.clone(), vector_store, embedder, "missing-collection");

        let outcome = workflow.run_store(NewMemoryRecord::new("still durable")).await.unwrap();
        assert!(!outcome.vector_indexed);
        let stored = record_store.get(&outcome.id).await.unwrap().unwrap();
        assert!(!stored.vector_indexed);
        assert_eq!(stored.content, "still durable");
    }

    #[tokio::test]
    async fn run_store_assigns_fresh_ids_across_calls() {
        let (workflow, _rs, _vs) = workflow_with_collection().await;
        let a = workflow.run_store(NewMemoryRecord::new("one")).await.unwrap();
        let b = workflow.run_store(NewMemoryRecord::new("two")).await.unwrap();
        assert_ne!(a.id, b.id);
    }
}
