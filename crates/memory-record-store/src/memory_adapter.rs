// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory `RecordStore` / `CheckpointStore` / `RelationshipStore`
//! adapter: deterministic and test-friendly, not a production backend.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memory_core::{Checkpoint, MemoryRecord};
use memory_error::{MemoryError, MemoryResult};

use crate::filter::{matches_all, RecordFilter};
use crate::traits::{CheckpointStore, Page, RecordStore, RelationshipRecord, RelationshipStore};

/// In-memory adapter backing the C1 contract for tests and the short-term
/// layer's test harness id factory.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<String, MemoryRecord>>,
    checkpoints: RwLock<HashMap<String, Checkpoint>>,
    relationships: RwLock<HashMap<String, RelationshipRecord>>,
}

impl InMemoryRecordStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn records_read(&self) -> MemoryResult<std::sync::RwLockReadGuard<'_, HashMap<String, MemoryRecord>>> {
        self.records
            .read()
            .map_err(|_| MemoryError::internal("memories lock poisoned"))
    }

    fn records_write(&self) -> MemoryResult<std::sync::RwLockWriteGuard<'_, HashMap<String, MemoryRecord>>> {
        self.records
            .write()
            .map_err(|_| MemoryError::internal("memories lock poisoned"))
    }

    fn checkpoints_read(
        &self,
    ) -> MemoryResult<std::sync::RwLockReadGuard<'_, HashMap<String, Checkpoint>>> {
        self.checkpoints
            .read()
            .map_err(|_| MemoryError::internal("checkpoints lock poisoned"))
    }

    fn checkpoints_write(
        &self,
    ) -> MemoryResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Checkpoint>>> {
        self.checkpoints
            .write()
            .map_err(|_| MemoryError::internal("checkpoints lock poisoned"))
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, record: MemoryRecord) -> MemoryResult<()> {
        self.records_write()?.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> MemoryResult<Option<MemoryRecord>> {
        Ok(self.records_read()?.get(id).cloned())
    }

    async fn set_vector_indexed(&self, id: &str, value: bool) -> MemoryResult<()> {
        let mut guard = self.records_write()?;
        let record = guard
            .get_mut(id)
            .ok_or_else(|| MemoryError::not_found(format!("record {id} not found")))?;
        record.vector_indexed = value;
        Ok(())
    }

    async fn search_fts(
        &self,
        query: &str,
        filters: &[RecordFilter],
        limit: usize,
    ) -> MemoryResult<Vec<MemoryRecord>> {
        let needle = query.trim().to_lowercase();
        let guard = self.records_read()?;
        let mut hits: Vec<MemoryRecord> = guard
            .values()
            .filter(|r| needle.is_empty() || r.content.to_lowercase().contains(&needle))
            .filter(|r| matches_all(filters, r))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        hits.truncate(limit);
        Ok(hits)
    }
}

#[async_trait]
impl CheckpointStore for InMemoryRecordStore {
    async fn upsert(&self, checkpoint: Checkpoint) -> MemoryResult<()> {
        self.checkpoints_write()?
            .insert(checkpoint.id().to_string(), checkpoint);
        Ok(())
    }

    async fn exists(&self, id: &str) -> MemoryResult<bool> {
        Ok(self.checkpoints_read()?.contains_key(id))
    }

    async fn get(&self, id: &str) -> MemoryResult<Option<Checkpoint>> {
        Ok(self.checkpoints_read()?.get(id).cloned())
    }

    async fn remove(&self, id: &str) -> MemoryResult<bool> {
        Ok(self.checkpoints_write()?.remove(id).is_some())
    }

    async fn list(&self, limit: usize, cursor: Option<DateTime<Utc>>) -> MemoryResult<Page<Checkpoint>> {
        let guard = self.checkpoints_read()?;
        let mut items: Vec<Checkpoint> = guard.values().cloned().collect();
        items.sort_by(|a, b| b.meta.created_at.cmp(&a.meta.created_at));
        if let Some(cursor) = cursor {
            let cursor_str = cursor.to_rfc3339();
            items.retain(|c| c.meta.created_at < cursor_str);
        }
        let next_cursor = if items.len() > limit {
            items
                .get(limit - 1)
                .and_then(|c| DateTime::parse_from_rfc3339(&c.meta.created_at).ok())
                .map(|dt| dt.with_timezone(&Utc))
        } else {
            None
        };
        items.truncate(limit);
        Ok(Page { items, next_cursor })
    }

    async fn count(&self) -> MemoryResult<usize> {
        Ok(self.checkpoints_read()?.len())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> MemoryResult<usize> {
        let cutoff_str = cutoff.to_rfc3339();
        let mut guard = self.checkpoints_write()?;
        let before = guard.len();
        guard.retain(|_, c| c.meta.created_at >= cutoff_str);
        Ok(before - guard.len())
    }

    async fn delete_oldest(&self, count: usize) -> MemoryResult<usize> {
        let mut guard = self.checkpoints_write()?;
        let mut ids: Vec<(String, String)> = guard
            .values()
            .map(|c| (c.id().to_string(), c.meta.created_at.clone()))
            .collect();
        ids.sort_by(|a, b| a.1.cmp(&b.1));
        let to_remove = ids.into_iter().take(count);
        let mut removed = 0usize;
        for (id, _) in to_remove {
            if guard.remove(&id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl RelationshipStore for InMemoryRecordStore {
    async fn create(&self, relationship: RelationshipRecord) -> MemoryResult<()> {
        self.relationships
            .write()
            .map_err(|_| MemoryError::internal("relationships lock poisoned"))?
            .insert(relationship.id.clone(), relationship);
        Ok(())
    }

    async fn find(&self, record_id: &str) -> MemoryResult<Vec<RelationshipRecord>> {
        let guard = self
            .relationships
            .read()
            .map_err(|_| MemoryError::internal("relationships lock poisoned"))?;
        Ok(guard
            .values()
            .filter(|r| r.source_id == record_id || r.target_id == record_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &str) -> MemoryResult<bool> {
        Ok(self
            .relationships
            .write()
            .map_err(|_| MemoryError::internal("relationships lock poisoned"))?
            .remove(id)
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::{CheckpointMeta, NewMemoryRecord};

    fn record(id: &str, content: &str) -> MemoryRecord {
        MemoryRecord::from_new(NewMemoryRecord::new(content), id, Utc::now())
    }

    fn checkpoint(id: &str, created_at: &str) -> Checkpoint {
        Checkpoint {
            meta: CheckpointMeta {
                id: id.to_string(),
                parent_id: None,
                branch_id: None,
                created_at: created_at.to_string(),
                score: None,
                labels: None,
                size_bytes: 2,
            },
            state: serde_json::json!({}),
            digest: "sha256:deadbeef".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = InMemoryRecordStore::new();
        store.insert(record("id1", "hello")).await.unwrap();
        let got = store.get("id1").await.unwrap().unwrap();
        assert_eq!(got.content, "hello");
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = InMemoryRecordStore::new();
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_vector_indexed_updates_flag_only() {
        let store = InMemoryRecordStore::new();
        store.insert(record("id1", "hello")).await.unwrap();
        store.set_vector_indexed("id1", true).await.unwrap();
        let got = store.get("id1").await.unwrap().unwrap();
        assert!(got.vector_indexed);
        assert_eq!(got.content, "hello");
    }

    #[tokio::test]
    async fn set_vector_indexed_missing_is_not_found() {
        let store = InMemoryRecordStore::new();
        let err = store.set_vector_indexed("missing", true).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn search_fts_filters_by_content_and_filter() {
        let store = InMemoryRecordStore::new();
        let mut r1 = record("id1", "Secure storage record");
        r1.metadata
            .insert("tenant".to_string(), serde_json::json!("tenant-a"));
        store.insert(r1).await.unwrap();
        store.insert(record("id2", "Unrelated note")).await.unwrap();

        let hits = store
            .search_fts("secure", &[RecordFilter::Tenant("tenant-a".into())], 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "id1");

        let hits = store
            .search_fts("secure", &[RecordFilter::Tenant("tenant-b".into())], 5)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn checkpoint_list_orders_desc_by_created_at() {
        let store = InMemoryRecordStore::new();
        store.upsert(checkpoint("ckpt_a", "2026-01-01T00:00:00+00:00")).await.unwrap();
        store.upsert(checkpoint("ckpt_b", "2026-01-02T00:00:00+00:00")).await.unwrap();
        let page = store.list(10, None).await.unwrap();
        assert_eq!(page.items[0].id(), "ckpt_b");
        assert_eq!(page.items[1].id(), "ckpt_a");
    }

    #[tokio::test]
    async fn checkpoint_delete_oldest_removes_lowest_created_at() {
        let store = InMemoryRecordStore::new();
        store.upsert(checkpoint("ckpt_a", "2026-01-01T00:00:00+00:00")).await.unwrap();
        store.upsert(checkpoint("ckpt_b", "2026-01-02T00:00:00+00:00")).await.unwrap();
        let removed = store.delete_oldest(1).await.unwrap();
        assert_eq!(removed, 1);
        assert!(!store.exists("ckpt_a").await.unwrap());
        assert!(store.exists("ckpt_b").await.unwrap());
    }

    #[tokio::test]
    async fn relationship_find_matches_either_endpoint() {
        let store = InMemoryRecordStore::new();
        store
            .create(RelationshipRecord {
                id: "rel1".into(),
                source_id: "a".into(),
                target_id: "b".into(),
                relationship_type: "mentions".into(),
                strength: 1.0,
                bidirectional: false,
                created_at: Utc::now(),
                metadata: None,
            })
            .await
            .unwrap();
        assert_eq!(store.find("a").await.unwrap().len(), 1);
        assert_eq!(store.find("b").await.unwrap().len(), 1);
        assert_eq!(store.find("c").await.unwrap().len(), 0);
    }
}
