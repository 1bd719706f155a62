// SPDX-License-Identifier: MIT OR Apache-2.0
//! Memory records: the durable, opaque unit written and retrieved.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::redact::scrub;

/// Default importance assigned when a caller doesn't specify one.
pub const DEFAULT_IMPORTANCE: u8 = 5;
/// Minimum valid importance.
pub const MIN_IMPORTANCE: u8 = 1;
/// Maximum valid importance.
pub const MAX_IMPORTANCE: u8 = 10;

/// Clamp an importance value into `[MIN_IMPORTANCE, MAX_IMPORTANCE]`.
#[must_use]
pub fn clamp_importance(value: i64) -> u8 {
    value.clamp(i64::from(MIN_IMPORTANCE), i64::from(MAX_IMPORTANCE)) as u8
}

/// Normalize a tag set: trim, lowercase, drop empties, dedupe while
/// preserving first-seen order.
///
/// # Examples
///
/// ```
/// use memory_core::record::normalize_tags;
///
/// let tags = normalize_tags(&[" Alpha ".into(), "".into(), "alpha".into(), "Beta".into()]);
/// assert_eq!(tags, vec!["alpha".to_string(), "beta".to_string()]);
/// ```
#[must_use]
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for tag in tags {
        let normalized = tag.trim().to_lowercase();
        if normalized.is_empty() {
            continue;
        }
        if seen.insert(normalized.clone()) {
            out.push(normalized);
        }
    }
    out
}

/// Derive the `sha256:<hex>` content hash used when `metadata.content_hash`
/// is absent. Hashing is performed over the redaction-scrubbed content, the
/// same text a write passes to the embedding provider.
#[must_use]
pub fn derive_content_hash(content: &str) -> String {
    let scrubbed = scrub(content);
    let mut hasher = Sha256::new();
    hasher.update(scrubbed.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}

/// Caller-supplied fields for a new memory record, prior to id/timestamp
/// assignment by the write workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NewMemoryRecord {
    /// UTF-8 text content.
    pub content: String,
    /// Importance 1-10; `None` defaults to [`DEFAULT_IMPORTANCE`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,
    /// Optional domain label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Free-form tags, normalized on persist.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Free mapping carrying tenant, labels, content hash, source URI, etc.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl NewMemoryRecord {
    /// Start building a new record with the given content and all other
    /// fields defaulted.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Set the importance (builder style).
    #[must_use]
    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = Some(importance);
        self
    }

    /// Set the domain (builder style).
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Append a tag (builder style).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Insert a metadata key-value pair (builder style).
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.metadata.insert(key.into(), v);
        }
        self
    }
}

/// A persisted memory record.
///
/// `id` is immutable after insert. Tags and importance are normalized at
/// construction time; `metadata["content_hash"]` is derived from scrubbed
/// content when the caller didn't supply one.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MemoryRecord {
    /// Process-unique opaque identifier.
    pub id: String,
    /// UTF-8 text content, stored verbatim (never redacted).
    pub content: String,
    /// Importance, clamped to `[1, 10]`.
    pub importance: u8,
    /// Optional domain label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Normalized tag set (lowercased, trimmed, deduped).
    pub tags: Vec<String>,
    /// Free mapping carrying tenant, labels, content hash, source URI.
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Instant of first persist.
    pub created_at: DateTime<Utc>,
    /// Instant of last mutation (equals `created_at` until an explicit
    /// update path, not specified by this crate, mutates the record).
    pub updated_at: DateTime<Utc>,
    /// Whether the record has been acknowledged by the vector store.
    pub vector_indexed: bool,
}

impl MemoryRecord {
    /// Construct a persisted record from caller input plus an id and a
    /// timestamp, applying every normalization invariant.
    #[must_use]
    pub fn from_new(new: NewMemoryRecord, id: impl Into<String>, now: DateTime<Utc>) -> Self {
        let mut metadata = new.metadata;
        metadata
            .entry("content_hash".to_string())
            .or_insert_with(|| serde_json::Value::String(derive_content_hash(&new.content)));

        Self {
            id: id.into(),
            content: new.content,
            importance: clamp_importance(i64::from(new.importance.unwrap_or(DEFAULT_IMPORTANCE))),
            domain: new.domain,
            tags: normalize_tags(&new.tags),
            metadata,
            created_at: now,
            updated_at: now,
            vector_indexed: false,
        }
    }

    /// Returns the content hash recorded in metadata, if any.
    #[must_use]
    pub fn content_hash(&self) -> Option<&str> {
        self.metadata.get("content_hash").and_then(|v| v.as_str())
    }

    /// Returns the tenant recorded in metadata, if any.
    #[must_use]
    pub fn tenant(&self) -> Option<&str> {
        self.metadata.get("tenant").and_then(|v| v.as_str())
    }

    /// The `memory_layer` a vector-store payload should carry for this
    /// record: `long_term` when importance is at least 8, else `semantic`.
    #[must_use]
    pub fn memory_layer(&self) -> MemoryLayer {
        if self.importance >= 8 {
            MemoryLayer::LongTerm
        } else {
            MemoryLayer::Semantic
        }
    }
}

/// Vector-store payload tag chosen by importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MemoryLayer {
    /// Importance below the long-term threshold.
    Semantic,
    /// Importance at or above the long-term threshold (>= 8).
    LongTerm,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn importance_defaults_to_five() {
        let r = MemoryRecord::from_new(NewMemoryRecord::new("hello"), "id1", now());
        assert_eq!(r.importance, DEFAULT_IMPORTANCE);
    }

    #[test]
    fn importance_is_clamped() {
        assert_eq!(clamp_importance(0), 1);
        assert_eq!(clamp_importance(100), 10);
        assert_eq!(clamp_importance(7), 7);
    }

    #[test]
    fn tags_are_normalized() {
        let new = NewMemoryRecord::new("hi")
            .with_tag(" Alpha ")
            .with_tag("alpha")
            .with_tag("")
            .with_tag("Beta");
        let r = MemoryRecord::from_new(new, "id2", now());
        assert_eq!(r.tags, vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn content_hash_is_derived_when_absent() {
        let r = MemoryRecord::from_new(NewMemoryRecord::new("Secure storage record"), "id3", now());
        let hash = r.content_hash().unwrap();
        assert!(hash.starts_with("sha256:"));
        assert_eq!(hash.len(), "sha256:".len() + 64);
    }

    #[test]
    fn content_hash_is_preserved_when_present() {
        let new = NewMemoryRecord::new("hi").with_metadata("content_hash", "sha256:deadbeef");
        let r = MemoryRecord::from_new(new, "id4", now());
        assert_eq!(r.content_hash(), Some("sha256:deadbeef"));
    }

    #[test]
    fn memory_layer_by_importance() {
        let long_term = MemoryRecord::from_new(
            NewMemoryRecord::new("critical").with_importance(9),
            "id5",
            now(),
        );
        assert_eq!(long_term.memory_layer(), MemoryLayer::LongTerm);

        let semantic = MemoryRecord::from_new(
            NewMemoryRecord::new("mundane").with_importance(5),
            "id6",
            now(),
        );
        assert_eq!(semantic.memory_layer(), MemoryLayer::Semantic);
    }

    #[test]
    fn vector_indexed_starts_false() {
        let r = MemoryRecord::from_new(NewMemoryRecord::new("hi"), "id7", now());
        assert!(!r.vector_indexed);
    }

    #[test]
    fn id_is_immutable_field_not_recomputed() {
        let r = MemoryRecord::from_new(NewMemoryRecord::new("hi"), "fixed-id", now());
        assert_eq!(r.id, "fixed-id");
    }

    #[test]
    fn tenant_and_content_hash_reads_from_metadata() {
        let new = NewMemoryRecord::new("hi").with_metadata("tenant", "tenant-a");
        let r = MemoryRecord::from_new(new, "id8", now());
        assert_eq!(r.tenant(), Some("tenant-a"));
    }

    proptest::proptest! {
        #[test]
        fn clamp_importance_never_escapes_bounds(v: i64) {
            let clamped = clamp_importance(v);
            proptest::prop_assert!((MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(&clamped));
        }

        #[test]
        fn normalize_tags_never_contains_empty_or_duplicates(tags: Vec<String>) {
            let normalized = normalize_tags(&tags);
            for t in &normalized {
                proptest::prop_assert!(!t.is_empty());
                proptest::prop_assert_eq!(t, &t.to_lowercase());
            }
            let unique: std::collections::HashSet<_> = normalized.iter().collect();
            proptest::prop_assert_eq!(unique.len(), normalized.len());
        }
    }
}
