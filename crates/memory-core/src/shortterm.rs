// SPDX-License-Identifier: MIT OR Apache-2.0
//! Short-term (working-memory) data types shared between `memory-core` and
//! `memory-shortterm`.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single scratchpad entry inside a [`Session`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ShortTermEntry {
    /// Opaque entry identifier.
    pub id: String,
    /// UTF-8 text content.
    pub content: String,
    /// Importance 1-10.
    pub importance: u8,
    /// Instant the entry was appended.
    pub stored_at: DateTime<Utc>,
    /// Optional caller-supplied metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

impl ShortTermEntry {
    /// Returns `true` if this entry is still live under the given `ttl` as
    /// of `now` (`now - stored_at < ttl`).
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now.signed_duration_since(self.stored_at) < ttl
    }
}

/// A per-session scratchpad: an ordered sequence of [`ShortTermEntry`].
///
/// A session exists iff it has at least one live entry; callers never
/// observe an empty session directly (see `ShortTermMemory::get_session`
/// in `memory-shortterm`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Session {
    /// Session identifier, caller-chosen.
    pub id: String,
    /// Instant the session was first written to.
    pub created_at: DateTime<Utc>,
    /// Entries in insertion order.
    pub entries: Vec<ShortTermEntry>,
}

impl Session {
    /// Create a new, empty session.
    #[must_use]
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at,
            entries: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn entry_is_live_within_ttl() {
        let entry = ShortTermEntry {
            id: "e1".into(),
            content: "hi".into(),
            importance: 5,
            stored_at: at(0),
            metadata: None,
        };
        assert!(entry.is_live(at(10), chrono::Duration::seconds(30)));
        assert!(!entry.is_live(at(45), chrono::Duration::seconds(30)));
    }

    #[test]
    fn new_session_is_empty() {
        let s = Session::new("s1", at(0));
        assert!(s.entries.is_empty());
    }
}
