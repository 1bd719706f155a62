// SPDX-License-Identifier: MIT OR Apache-2.0
//! Request/response shapes for the checkpoint engine, kept distinct from
//! the durable [`memory_core::Checkpoint`] type the way
//! [`memory_core::NewMemoryRecord`] is kept distinct from
//! [`memory_core::MemoryRecord`].

use memory_core::Checkpoint;

/// Caller-supplied fields for a new checkpoint, prior to digest
/// computation and meta normalization.
#[derive(Debug, Clone)]
pub struct NewCheckpoint {
    /// Id, always prefixed `ckpt_`.
    pub id: String,
    /// Parent checkpoint id, if any.
    pub parent_id: Option<String>,
    /// Branch id, if this checkpoint belongs to a branch.
    pub branch_id: Option<String>,
    /// Optional caller-assigned score.
    pub score: Option<f64>,
    /// Optional labels.
    pub labels: Option<Vec<String>>,
    /// Opaque agent state to snapshot.
    pub state: serde_json::Value,
}

impl NewCheckpoint {
    /// Start building a new checkpoint from an id and state.
    #[must_use]
    pub fn new(id: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            branch_id: None,
            score: None,
            labels: None,
            state,
        }
    }

    /// Set the parent id (builder style).
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Set the branch id (builder style).
    #[must_use]
    pub fn with_branch(mut self, branch_id: impl Into<String>) -> Self {
        self.branch_id = Some(branch_id.into());
        self
    }

    /// Set the score (builder style).
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Set labels (builder style).
    #[must_use]
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }
}

/// Whether `save` may overwrite an existing id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// If `false` (the default) and `id` already exists, `save` fails
    /// with `Validation`.
    pub overwrite: bool,
}

/// A request to fan a checkpoint out into `count` sibling branches.
#[derive(Debug, Clone)]
pub struct BranchRequest {
    /// Id of the checkpoint to branch from.
    pub from: String,
    /// Number of new checkpoints to create, `1..=branch_budget`.
    pub count: u32,
    /// Labels applied to every created checkpoint, overriding the
    /// parent's labels when present.
    pub labels: Option<Vec<String>>,
}

/// The result of a successful `branch` call.
#[derive(Debug, Clone)]
pub struct BranchResult {
    /// The parent checkpoint, unmodified.
    pub parent: Checkpoint,
    /// The freshly allocated branch id shared by every created checkpoint.
    pub branch_id: String,
    /// Ids of the newly created checkpoints, in creation order.
    pub checkpoint_ids: Vec<String>,
}

/// The `(meta, state, digest)` view returned by `context`.
#[derive(Debug, Clone)]
pub struct CheckpointContext {
    /// Checkpoint metadata.
    pub meta: memory_core::CheckpointMeta,
    /// Opaque state envelope.
    pub state: serde_json::Value,
    /// Content digest of `state`.
    pub digest: String,
}
