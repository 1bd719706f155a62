// SPDX-License-Identifier: MIT OR Apache-2.0
//! `sqlx`-backed C1 adapter. Schema matches the wire contract exactly,
//! including the `memories_fts` virtual table kept in sync via triggers.
//!
//! `sqlx` does not model FTS5 natively, so the virtual table and its
//! triggers are created with raw SQL at migration time.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use memory_core::{Checkpoint, CheckpointMeta, MemoryRecord};
use memory_error::{MemoryError, MemoryResult};
use sqlx::{Row, SqlitePool};

use crate::filter::RecordFilter;
use crate::traits::{CheckpointStore, Page, RecordStore, RelationshipRecord, RelationshipStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    importance INTEGER NOT NULL,
    domain TEXT,
    tags TEXT,
    metadata TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    vector_indexed INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_memories_domain ON memories(domain);
CREATE INDEX IF NOT EXISTS idx_memories_created_at ON memories(created_at);
CREATE INDEX IF NOT EXISTS idx_memories_importance ON memories(importance);
CREATE INDEX IF NOT EXISTS idx_memories_vector_indexed ON memories(vector_indexed);

CREATE VIRTUAL TABLE IF NOT EXISTS memories_fts USING fts5(
    content, content='memories', content_rowid='rowid', tokenize='porter'
);

CREATE TRIGGER IF NOT EXISTS memories_ai AFTER INSERT ON memories BEGIN
    INSERT INTO memories_fts(rowid, content) VALUES (new.rowid, new.content);
END;
CREATE TRIGGER IF NOT EXISTS memories_ad AFTER DELETE ON memories BEGIN
    INSERT INTO memories_fts(memories_fts, rowid, content) VALUES('delete', old.rowid, old.content);
END;
CREATE TRIGGER IF NOT EXISTS memories_au AFTER UPDATE ON memories BEGIN
    INSERT INTO memories_fts(memories_fts, rowid, content) VALUES('delete', old.rowid, old.content);
    INSERT INTO memories_fts(rowid, content) VALUES (new.rowid, new.content);
END;

CREATE TABLE IF NOT EXISTS memory_relationships (
    id TEXT PRIMARY KEY,
    source_id TEXT NOT NULL,
    target_id TEXT NOT NULL,
    type TEXT NOT NULL,
    strength REAL NOT NULL,
    bidirectional INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    metadata TEXT
);
CREATE INDEX IF NOT EXISTS idx_relationships_source ON memory_relationships(source_id);
CREATE INDEX IF NOT EXISTS idx_relationships_target ON memory_relationships(target_id);
CREATE INDEX IF NOT EXISTS idx_relationships_type ON memory_relationships(type);

CREATE TABLE IF NOT EXISTS checkpoints (
    id TEXT PRIMARY KEY,
    parent_id TEXT,
    branch_id TEXT,
    created_at TEXT NOT NULL,
    score REAL,
    labels TEXT,
    size_bytes INTEGER NOT NULL,
    digest TEXT NOT NULL,
    state_json TEXT NOT NULL,
    meta_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_checkpoints_branch_id ON checkpoints(branch_id);
CREATE INDEX IF NOT EXISTS idx_checkpoints_created_at ON checkpoints(created_at);
CREATE INDEX IF NOT EXISTS idx_checkpoints_parent_id ON checkpoints(parent_id);
"#;

/// A `sqlx`/SQLite-backed implementation of the C1 contract.
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Connect and run the schema migration.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the connection or migration fails.
    pub async fn connect(url: &str) -> MemoryResult<Self> {
        let pool = SqlitePool::connect(url)
            .await
            .map_err(|e| MemoryError::storage("failed to connect to sqlite").with_source(e))?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an already-connected pool, running the schema migration.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the migration fails.
    pub async fn from_pool(pool: SqlitePool) -> MemoryResult<Self> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> MemoryResult<()> {
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| MemoryError::storage("schema migration failed").with_source(e))?;
        }
        Ok(())
    }
}

fn to_millis(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> MemoryResult<MemoryRecord> {
    let tags_json: Option<String> = row.try_get("tags").ok();
    let metadata_json: Option<String> = row.try_get("metadata").ok();
    let tags: Vec<String> = tags_json
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default();
    let metadata = metadata_json
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default();
    Ok(MemoryRecord {
        id: row
            .try_get("id")
            .map_err(|e| MemoryError::storage("row missing id").with_source(e))?,
        content: row
            .try_get("content")
            .map_err(|e| MemoryError::storage("row missing content").with_source(e))?,
        importance: row
            .try_get::<i64, _>("importance")
            .map_err(|e| MemoryError::storage("row missing importance").with_source(e))? as u8,
        domain: row.try_get("domain").ok(),
        tags,
        metadata,
        created_at: from_millis(
            row.try_get("created_at")
                .map_err(|e| MemoryError::storage("row missing created_at").with_source(e))?,
        ),
        updated_at: from_millis(
            row.try_get("updated_at")
                .map_err(|e| MemoryError::storage("row missing updated_at").with_source(e))?,
        ),
        vector_indexed: row
            .try_get::<i64, _>("vector_indexed")
            .map_err(|e| MemoryError::storage("row missing vector_indexed").with_source(e))?
            != 0,
    })
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: MemoryRecord) -> MemoryResult<()> {
        let tags_json = serde_json::to_string(&record.tags).unwrap_or_default();
        let metadata_json = serde_json::to_string(&record.metadata).unwrap_or_default();
        sqlx::query(
            "INSERT INTO memories (id, content, importance, domain, tags, metadata, created_at, updated_at, vector_indexed) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.content)
        .bind(i64::from(record.importance))
        .bind(&record.domain)
        .bind(tags_json)
        .bind(metadata_json)
        .bind(to_millis(record.created_at))
        .bind(to_millis(record.updated_at))
        .bind(i64::from(record.vector_indexed))
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::storage("failed to insert memory").with_source(e))?;
        Ok(())
    }

    async fn get(&self, id: &str) -> MemoryResult<Option<MemoryRecord>> {
        let row = sqlx::query("SELECT * FROM memories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| MemoryError::storage("failed to fetch memory").with_source(e))?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn set_vector_indexed(&self, id: &str, value: bool) -> MemoryResult<()> {
        let result = sqlx::query("UPDATE memories SET vector_indexed = ? WHERE id = ?")
            .bind(i64::from(value))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::storage("failed to update vector_indexed").with_source(e))?;
        if result.rows_affected() == 0 {
            return Err(MemoryError::not_found(format!("record {id} not found")));
        }
        Ok(())
    }

    async fn search_fts(
        &self,
        query: &str,
        filters: &[RecordFilter],
        limit: usize,
    ) -> MemoryResult<Vec<MemoryRecord>> {
        // The FTS5 MATCH operator is parameterized; filters are translated to
        // JSON-path extractions against `metadata`/`tags`, never interpolated
        // as literal SQL.
        let mut sql = String::from(
            "SELECT m.* FROM memories m JOIN memories_fts f ON m.rowid = f.rowid WHERE f.content MATCH ?",
        );
        let mut bind_strings: Vec<String> = vec![query.to_string()];
        for filter in filters {
            match filter {
                RecordFilter::Domain(domain) => {
                    sql.push_str(" AND m.domain = ?");
                    bind_strings.push(domain.clone());
                }
                RecordFilter::Tenant(tenant) => {
                    sql.push_str(" AND json_extract(m.metadata, '$.tenant') = ?");
                    bind_strings.push(tenant.clone());
                }
                RecordFilter::LabelAll(label) => {
                    sql.push_str(
                        " AND EXISTS (SELECT 1 FROM json_each(json_extract(m.metadata, '$.labels')) je WHERE je.value = ?)",
                    );
                    bind_strings.push(label.clone());
                }
                RecordFilter::TagsAny(tags) => {
                    if tags.is_empty() {
                        continue;
                    }
                    let placeholders = tags.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
                    sql.push_str(&format!(
                        " AND EXISTS (SELECT 1 FROM json_each(m.tags) je WHERE je.value IN ({placeholders}))"
                    ));
                    bind_strings.extend(tags.iter().cloned());
                }
            }
        }
        sql.push_str(" ORDER BY m.created_at DESC LIMIT ?");

        let mut q = sqlx::query(&sql);
        for s in &bind_strings {
            q = q.bind(s);
        }
        q = q.bind(limit as i64);

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MemoryError::storage("fts search failed").with_source(e))?;
        rows.iter().map(record_from_row).collect()
    }
}

#[async_trait]
impl CheckpointStore for SqliteRecordStore {
    async fn upsert(&self, checkpoint: Checkpoint) -> MemoryResult<()> {
        let state_json = serde_json::to_string(&checkpoint.state).unwrap_or_default();
        let meta_json = serde_json::to_string(&checkpoint.meta).unwrap_or_default();
        let labels_json = checkpoint
            .meta
            .labels
            .as_ref()
            .map(|l| serde_json::to_string(l).unwrap_or_default());
        sqlx::query(
            "INSERT INTO checkpoints (id, parent_id, branch_id, created_at, score, labels, size_bytes, digest, state_json, meta_json) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET parent_id=excluded.parent_id, branch_id=excluded.branch_id, \
             created_at=excluded.created_at, score=excluded.score, labels=excluded.labels, \
             size_bytes=excluded.size_bytes, digest=excluded.digest, state_json=excluded.state_json, meta_json=excluded.meta_json",
        )
        .bind(&checkpoint.meta.id)
        .bind(&checkpoint.meta.parent_id)
        .bind(&checkpoint.meta.branch_id)
        .bind(&checkpoint.meta.created_at)
        .bind(checkpoint.meta.score)
        .bind(labels_json)
        .bind(checkpoint.meta.size_bytes as i64)
        .bind(&checkpoint.digest)
        .bind(state_json)
        .bind(meta_json)
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::storage("failed to upsert checkpoint").with_source(e))?;
        Ok(())
    }

    async fn exists(&self, id: &str) -> MemoryResult<bool> {
        let row = sqlx::query("SELECT 1 FROM checkpoints WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| MemoryError::storage("failed to check checkpoint existence").with_source(e))?;
        Ok(row.is_some())
    }

    async fn get(&self, id: &str) -> MemoryResult<Option<Checkpoint>> {
        let row = sqlx::query("SELECT * FROM checkpoints WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| MemoryError::storage("failed to fetch checkpoint").with_source(e))?;
        row.as_ref().map(checkpoint_from_row).transpose()
    }

    async fn remove(&self, id: &str) -> MemoryResult<bool> {
        let result = sqlx::query("DELETE FROM checkpoints WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::storage("failed to remove checkpoint").with_source(e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, limit: usize, cursor: Option<DateTime<Utc>>) -> MemoryResult<Page<Checkpoint>> {
        let rows = if let Some(cursor) = cursor {
            sqlx::query("SELECT * FROM checkpoints WHERE created_at < ? ORDER BY created_at DESC LIMIT ?")
                .bind(cursor.to_rfc3339())
                .bind((limit + 1) as i64)
                .fetch_all(&self.pool)
                .await
        } else {
            sqlx::query("SELECT * FROM checkpoints ORDER BY created_at DESC LIMIT ?")
                .bind((limit + 1) as i64)
                .fetch_all(&self.pool)
                .await
        }
        .map_err(|e| MemoryError::storage("failed to list checkpoints").with_source(e))?;

        let mut items = rows
            .iter()
            .map(checkpoint_from_row)
            .collect::<MemoryResult<Vec<_>>>()?;
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
        let row = sqlx::query("SELECT COUNT(*) AS n FROM checkpoints")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MemoryError::storage("failed to count checkpoints").with_source(e))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| MemoryError::storage("malformed count result").with_source(e))?;
        Ok(n as usize)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> MemoryResult<usize> {
        let result = sqlx::query("DELETE FROM checkpoints WHERE created_at < ?")
            .bind(cutoff.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::storage("failed to prune expired checkpoints").with_source(e))?;
        Ok(result.rows_affected() as usize)
    }

    async fn delete_oldest(&self, count: usize) -> MemoryResult<usize> {
        let result = sqlx::query(
            "DELETE FROM checkpoints WHERE id IN (SELECT id FROM checkpoints ORDER BY created_at ASC LIMIT ?)",
        )
        .bind(count as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::storage("failed to prune overflow checkpoints").with_source(e))?;
        Ok(result.rows_affected() as usize)
    }
}

fn checkpoint_from_row(row: &sqlx::sqlite::SqliteRow) -> MemoryResult<Checkpoint> {
    let labels_json: Option<String> = row.try_get("labels").ok();
    let labels = labels_json.and_then(|s| serde_json::from_str(&s).ok());
    let state_json: String = row
        .try_get("state_json")
        .map_err(|e| MemoryError::storage("row missing state_json").with_source(e))?;
    let state = serde_json::from_str(&state_json)
        .map_err(|e| MemoryError::storage("malformed stored state").with_source(e))?;
    Ok(Checkpoint {
        meta: CheckpointMeta {
            id: row
                .try_get("id")
                .map_err(|e| MemoryError::storage("row missing id").with_source(e))?,
            parent_id: row.try_get("parent_id").ok(),
            branch_id: row.try_get("branch_id").ok(),
            created_at: row
                .try_get("created_at")
                .map_err(|e| MemoryError::storage("row missing created_at").with_source(e))?,
            score: row.try_get("score").ok(),
            labels,
            size_bytes: row
                .try_get::<i64, _>("size_bytes")
                .map_err(|e| MemoryError::storage("row missing size_bytes").with_source(e))? as u64,
        },
        state,
        digest: row
            .try_get("digest")
            .map_err(|e| MemoryError::storage("row missing digest").with_source(e))?,
    })
}

#[async_trait]
impl RelationshipStore for SqliteRecordStore {
    async fn create(&self, relationship: RelationshipRecord) -> MemoryResult<()> {
        let metadata_json = relationship
            .metadata
            .as_ref()
            .map(|m| serde_json::to_string(m).unwrap_or_default());
        sqlx::query(
            "INSERT INTO memory_relationships (id, source_id, target_id, type, strength, bidirectional, created_at, metadata) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&relationship.id)
        .bind(&relationship.source_id)
        .bind(&relationship.target_id)
        .bind(&relationship.relationship_type)
        .bind(relationship.strength)
        .bind(i64::from(relationship.bidirectional))
        .bind(to_millis(relationship.created_at))
        .bind(metadata_json)
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::storage("failed to insert relationship").with_source(e))?;
        Ok(())
    }

    async fn find(&self, record_id: &str) -> MemoryResult<Vec<RelationshipRecord>> {
        let rows = sqlx::query("SELECT * FROM memory_relationships WHERE source_id = ? OR target_id = ?")
            .bind(record_id)
            .bind(record_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MemoryError::storage("failed to query relationships").with_source(e))?;
        rows.iter()
            .map(|row| {
                let metadata_json: Option<String> = row.try_get("metadata").ok();
                Ok(RelationshipRecord {
                    id: row
                        .try_get("id")
                        .map_err(|e| MemoryError::storage("row missing id").with_source(e))?,
                    source_id: row
                        .try_get("source_id")
                        .map_err(|e| MemoryError::storage("row missing source_id").with_source(e))?,
                    target_id: row
                        .try_get("target_id")
                        .map_err(|e| MemoryError::storage("row missing target_id").with_source(e))?,
                    relationship_type: row
                        .try_get("type")
                        .map_err(|e| MemoryError::storage("row missing type").with_source(e))?,
                    strength: row
                        .try_get("strength")
                        .map_err(|e| MemoryError::storage("row missing strength").with_source(e))?,
                    bidirectional: row
                        .try_get::<i64, _>("bidirectional")
                        .map_err(|e| MemoryError::storage("row missing bidirectional").with_source(e))?
                        != 0,
                    created_at: from_millis(
                        row.try_get("created_at")
                            .map_err(|e| MemoryError::storage("row missing created_at").with_source(e))?,
                    ),
                    metadata: metadata_json.and_then(|s| serde_json::from_str(&s).ok()),
                })
            })
            .collect()
    }

    async fn delete(&self, id: &str) -> MemoryResult<bool> {
        let result = sqlx::query("DELETE FROM memory_relationships WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::storage("failed to delete relationship").with_source(e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::NewMemoryRecord;

    async fn store() -> SqliteRecordStore {
        SqliteRecordStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = store().await;
        let record = MemoryRecord::from_new(NewMemoryRecord::new("Secure storage record"), "id1", Utc::now());
        store.insert(record).await.unwrap();
        let got = store.get("id1").await.unwrap().unwrap();
        assert_eq!(got.content, "Secure storage record");
    }

    #[tokio::test]
    async fn fts_search_matches_content() {
        let store = store().await;
        let mut record = MemoryRecord::from_new(NewMemoryRecord::new("Secure storage record"), "id1", Utc::now());
        record
            .metadata
            .insert("tenant".to_string(), serde_json::json!("tenant-a"));
        store.insert(record).await.unwrap();

        let hits = store
            .search_fts("secure", &[RecordFilter::Tenant("tenant-a".into())], 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "id1");
    }

    #[tokio::test]
    async fn fts_injection_attempt_yields_zero_hits_and_schema_survives() {
        let store = store().await;
        let mut record = MemoryRecord::from_new(NewMemoryRecord::new("Secure storage record"), "id1", Utc::now());
        record
            .metadata
            .insert("tenant".to_string(), serde_json::json!("tenant-a"));
        store.insert(record).await.unwrap();

        let hits = store
            .search_fts(
                "\"'; DROP TABLE memories; --\"",
                &[RecordFilter::Tenant("tenant-a".into())],
                5,
            )
            .await;
        assert!(hits.map(|h| h.is_empty()).unwrap_or(true));

        let hits = store
            .search_fts("secure", &[RecordFilter::Tenant("tenant-a".into())], 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }
}
