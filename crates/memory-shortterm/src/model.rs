// SPDX-License-Identifier: MIT OR Apache-2.0
//! Request/response shapes for the short-term layer.

use chrono::{DateTime, Utc};
use memory_core::ShortTermEntry;
use std::collections::BTreeMap;

/// The fixed layer tag every short-term write carries.
pub const SHORT_TERM_LAYER: &str = "short_term";

/// A request to append an entry to a session (creating it if absent).
#[derive(Debug, Clone)]
pub struct StoreRequest {
    /// Target session id.
    pub session_id: String,
    /// UTF-8 text content.
    pub content: String,
    /// Importance 1-10; `None` defaults per [`memory_core::record::DEFAULT_IMPORTANCE`].
    pub importance: Option<u8>,
    /// Optional caller-supplied metadata, carried through to promotion.
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

impl StoreRequest {
    /// Start building a store request.
    #[must_use]
    pub fn new(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            content: content.into(),
            importance: None,
            metadata: None,
        }
    }

    /// Set importance (builder style).
    #[must_use]
    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = Some(importance);
        self
    }
}

/// The result of a successful `store`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreResult {
    /// The entry's id.
    pub id: String,
    /// The session it was appended to.
    pub session_id: String,
    /// Always `"short_term"`.
    pub layer: &'static str,
    /// Instant the entry was appended.
    pub stored_at: DateTime<Utc>,
}

/// The result of `flush_expired`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushResult {
    /// Total number of entries dropped across all sessions.
    pub removed: usize,
    /// Ids of sessions that became empty and were removed.
    pub expired_sessions: Vec<String>,
}

/// A pointer back to the checkpoint a reconstructed entry came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ReversiblePointer {
    /// The checkpoint id the entry was recovered from.
    pub checkpoint_id: String,
    /// The checkpoint's content digest at recovery time.
    pub digest: String,
    /// Always `"short_term"`.
    pub layer: &'static str,
}

/// One entry reconstructed from a checkpoint's `scratch.shortTerm`
/// substructure.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    /// The recovered entry.
    pub entry: ShortTermEntry,
    /// Provenance pointer back to the checkpoint.
    pub pointer: ReversiblePointer,
}

/// A short-term session reconstructed from a checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortTermSnapshot {
    /// The session id recorded in the checkpoint.
    pub session_id: String,
    /// Reconstructed entries, in the order stored in the checkpoint.
    pub entries: Vec<SnapshotEntry>,
}
