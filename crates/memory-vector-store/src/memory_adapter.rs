// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory `VectorStore` adapter: brute-force cosine search over a
//! `RwLock<HashMap>`, deterministic and test-friendly.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use memory_error::{MemoryError, MemoryResult};
use memory_record_store::RecordFilter;

use crate::types::{Distance, ScrollPage, SearchHit, SearchRequest, VectorPoint, VectorStore};

struct Collection {
    vector_size: usize,
    distance: Distance,
    points: HashMap<String, VectorPoint>,
}

/// In-memory adapter backing the C2 contract.
#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> MemoryResult<std::sync::RwLockReadGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .read()
            .map_err(|_| MemoryError::internal("vector collections lock poisoned"))
    }

    fn write(&self) -> MemoryResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .write()
            .map_err(|_| MemoryError::internal("vector collections lock poisoned"))
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn euclid(a: &[f32], b: &[f32]) -> f32 {
    let sum_sq: f32 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
    -sum_sq.sqrt()
}

fn score(distance: Distance, a: &[f32], b: &[f32]) -> f32 {
    match distance {
        Distance::Cosine => cosine(a, b),
        Distance::Dot => dot(a, b),
        Distance::Euclid => euclid(a, b),
    }
}

/// `true` iff every filter matches a point's payload. Payload is a JSON
/// map, not a `MemoryRecord`, so matching is done field-by-field against
/// the documented payload schema rather than reusing [`RecordFilter::matches`].
fn payload_matches(filters: &[RecordFilter], payload: &BTreeMap<String, serde_json::Value>) -> bool {
    filters.iter().all(|f| match f {
        RecordFilter::Domain(domain) => payload.get("domain").and_then(|v| v.as_str()) == Some(domain.as_str()),
        RecordFilter::Tenant(tenant) => payload.get("tenant").and_then(|v| v.as_str()) == Some(tenant.as_str()),
        RecordFilter::TagsAny(tags) => payload
            .get("tags")
            .and_then(|v| v.as_array())
            .is_some_and(|arr| arr.iter().any(|t| tags.iter().any(|wanted| t.as_str() == Some(wanted)))),
        RecordFilter::LabelAll(label) => payload
            .get("labels")
            .and_then(|v| v.as_array())
            .is_some_and(|arr| arr.iter().any(|l| l.as_str() == Some(label.as_str()))),
    })
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn get_collection(&self, name: &str) -> MemoryResult<bool> {
        Ok(self.read()?.contains_key(name))
    }

    async fn create_collection(&self, name: &str, vector_size: usize, distance: Distance) -> MemoryResult<()> {
        let mut guard = self.write()?;
        guard.entry(name.to_string()).or_insert_with(|| Collection {
            vector_size,
            distance,
            points: HashMap::new(),
        });
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> MemoryResult<()> {
        let mut guard = self.write()?;
        let coll = guard
            .get_mut(collection)
            .ok_or_else(|| MemoryError::not_found(format!("collection {collection} not found")))?;
        for point in points {
            if point.dense.len() != coll.vector_size {
                return Err(MemoryError::validation(format!(
                    "point {} has dimension {}, expected {}",
                    point.id,
                    point.dense.len(),
                    coll.vector_size
                )));
            }
            coll.points.insert(point.id.clone(), point);
        }
        Ok(())
    }

    async fn search(&self, collection: &str, request: SearchRequest) -> MemoryResult<Vec<SearchHit>> {
        let guard = self.read()?;
        let coll = guard
            .get(collection)
            .ok_or_else(|| MemoryError::not_found(format!("collection {collection} not found")))?;

        let mut hits: Vec<SearchHit> = coll
            .points
            .values()
            .filter(|p| payload_matches(&request.filters, &p.payload))
            .map(|p| {
                let sim = score(coll.distance, &request.dense, &p.dense);
                SearchHit {
                    id: p.id.clone(),
                    score: sim,
                    payload: if request.with_payload {
                        p.payload.clone()
                    } else {
                        BTreeMap::new()
                    },
                    vector: request.with_vector.then(|| p.dense.clone()),
                }
            })
            .collect();

        if let Some(threshold) = request.score_threshold {
            hits.retain(|h| h.score >= threshold);
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(request.limit);
        Ok(hits)
    }

    async fn scroll(
        &self,
        collection: &str,
        limit: usize,
        offset: Option<usize>,
        with_payload: bool,
        with_vectors: bool,
    ) -> MemoryResult<ScrollPage> {
        let guard = self.read()?;
        let coll = guard
            .get(collection)
            .ok_or_else(|| MemoryError::not_found(format!("collection {collection} not found")))?;
        let mut ids: Vec<&String> = coll.points.keys().collect();
        ids.sort();
        let start = offset.unwrap_or(0);
        let page_ids: Vec<&String> = ids.iter().skip(start).take(limit).copied().collect();
        let next_offset = if start + page_ids.len() < ids.len() {
            Some(start + page_ids.len())
        } else {
            None
        };
        let points = page_ids
            .into_iter()
            .filter_map(|id| coll.points.get(id))
            .map(|p| SearchHit {
                id: p.id.clone(),
                score: 0.0,
                payload: if with_payload { p.payload.clone() } else { BTreeMap::new() },
                vector: with_vectors.then(|| p.dense.clone()),
            })
            .collect();
        Ok(ScrollPage { points, next_offset })
    }

    async fn set_payload(
        &self,
        collection: &str,
        points: &[String],
        payload: BTreeMap<String, serde_json::Value>,
    ) -> MemoryResult<()> {
        let mut guard = self.write()?;
        let coll = guard
            .get_mut(collection)
            .ok_or_else(|| MemoryError::not_found(format!("collection {collection} not found")))?;
        for id in points {
            if let Some(point) = coll.points.get_mut(id) {
                point.payload.extend(payload.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, points: &[String]) -> MemoryResult<()> {
        let mut guard = self.write()?;
        let coll = guard
            .get_mut(collection)
            .ok_or_else(|| MemoryError::not_found(format!("collection {collection} not found")))?;
        for id in points {
            coll.points.remove(id);
        }
        Ok(())
    }

    async fn count(&self, collection: &str) -> MemoryResult<usize> {
        let guard = self.read()?;
        let coll = guard
            .get(collection)
            .ok_or_else(|| MemoryError::not_found(format!("collection {collection} not found")))?;
        Ok(coll.points.len())
    }

    async fn health(&self) -> MemoryResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, dense: Vec<f32>) -> VectorPoint {
        VectorPoint {
            id: id.to_string(),
            dense,
            sparse: None,
            payload: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn create_collection_then_upsert_and_search() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2, Distance::Cosine).await.unwrap();
        store
            .upsert("c", vec![point("p1", vec![1.0, 0.0]), point("p2", vec![0.0, 1.0])])
            .await
            .unwrap();

        let hits = store
            .search(
                "c",
                SearchRequest {
                    dense: vec![1.0, 0.0],
                    limit: 5,
                    with_payload: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(hits[0].id, "p1");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn upsert_rejects_wrong_dimension() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2, Distance::Cosine).await.unwrap();
        let err = store.upsert("c", vec![point("p1", vec![1.0])]).await.unwrap_err();
        assert_eq!(err.kind, memory_error::MemoryErrorKind::Validation);
    }

    #[tokio::test]
    async fn search_missing_collection_is_not_found() {
        let store = InMemoryVectorStore::new();
        let err = store
            .search("missing", SearchRequest::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn scroll_paginates_in_stable_order() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 1, Distance::Dot).await.unwrap();
        store
            .upsert(
                "c",
                vec![point("a", vec![1.0]), point("b", vec![1.0]), point("c", vec![1.0])],
            )
            .await
            .unwrap();
        let page1 = store.scroll("c", 2, None, true, false).await.unwrap();
        assert_eq!(page1.points.len(), 2);
        assert_eq!(page1.next_offset, Some(2));
        let page2 = store.scroll("c", 2, page1.next_offset, true, false).await.unwrap();
        assert_eq!(page2.points.len(), 1);
        assert!(page2.next_offset.is_none());
    }

    #[tokio::test]
    async fn delete_removes_points() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 1, Distance::Dot).await.unwrap();
        store.upsert("c", vec![point("a", vec![1.0])]).await.unwrap();
        store.delete("c", &["a".to_string()]).await.unwrap();
        assert_eq!(store.count("c").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn set_payload_merges_without_clearing_vector() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 1, Distance::Dot).await.unwrap();
        store.upsert("c", vec![point("a", vec![1.0])]).await.unwrap();
        let mut payload = BTreeMap::new();
        payload.insert("domain".to_string(), serde_json::json!("ops"));
        store.set_payload("c", &["a".to_string()], payload).await.unwrap();
        let page = store.scroll("c", 10, None, true, true).await.unwrap();
        assert_eq!(page.points[0].payload.get("domain").unwrap(), "ops");
        assert_eq!(page.points[0].vector, Some(vec![1.0]));
    }
}
