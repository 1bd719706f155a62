// SPDX-License-Identifier: MIT OR Apache-2.0
//! Checkpoint data types: content-addressed snapshots of agent state with
//! parent/branch lineage.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Prefix every checkpoint id carries.
pub const CHECKPOINT_ID_PREFIX: &str = "ckpt_";
/// Prefix every branch id carries.
pub const BRANCH_ID_PREFIX: &str = "branch_";

/// Checkpoint metadata, independent of the opaque state envelope it
/// describes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CheckpointMeta {
    /// Identifier, always prefixed [`CHECKPOINT_ID_PREFIX`].
    pub id: String,
    /// Parent checkpoint id, if this is a branch or successor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Branch id, always prefixed [`BRANCH_ID_PREFIX`] when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
    /// ISO-8601 creation instant.
    pub created_at: String,
    /// Optional caller-assigned score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Optional labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// Byte length of the serialized state.
    pub size_bytes: u64,
}

/// A checkpoint record: metadata, opaque state, and an integrity digest.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Checkpoint {
    /// Metadata (see [`CheckpointMeta`]).
    pub meta: CheckpointMeta,
    /// Opaque agent state envelope.
    pub state: serde_json::Value,
    /// `sha256:<hex>` digest of the canonical JSON of `state`.
    pub digest: String,
}

impl Checkpoint {
    /// Returns this checkpoint's id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.meta.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_id_accessor() {
        let ckpt = Checkpoint {
            meta: CheckpointMeta {
                id: "ckpt_abc".into(),
                parent_id: None,
                branch_id: None,
                created_at: "2026-01-01T00:00:00Z".into(),
                score: None,
                labels: None,
                size_bytes: 2,
            },
            state: serde_json::json!({}),
            digest: "sha256:deadbeef".into(),
        };
        assert_eq!(ckpt.id(), "ckpt_abc");
    }
}
