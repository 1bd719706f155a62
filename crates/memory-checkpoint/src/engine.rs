// SPDX-License-Identifier: MIT OR Apache-2.0
//! The C7 checkpoint engine: save/load/list/remove/rollback/branch and
//! retention pruning over a [`CheckpointStore`].

use std::sync::Arc;

use memory_core::{Checkpoint, CheckpointMeta, Clock, BRANCH_ID_PREFIX};
use memory_error::{MemoryError, MemoryResult};
use memory_record_store::{CheckpointStore, Page};
use tracing::{info, warn};

use crate::config::CheckpointPolicy;
use crate::digest::compute_digest;
use crate::model::{BranchRequest, BranchResult, CheckpointContext, NewCheckpoint, SaveOptions};

/// The checkpoint engine, wired to a [`CheckpointStore`] and an injected
/// [`Clock`].
pub struct CheckpointEngine {
    store: Arc<dyn CheckpointStore>,
    clock: Arc<dyn Clock>,
    policy: CheckpointPolicy,
}

impl CheckpointEngine {
    /// Construct an engine over a store, clock, and retention policy.
    #[must_use]
    pub fn new(store: Arc<dyn CheckpointStore>, clock: Arc<dyn Clock>, policy: CheckpointPolicy) -> Self {
        Self { store, clock, policy }
    }

    /// Save a checkpoint, recomputing its digest from `state` and
    /// normalizing `created_at`/`size_bytes`, then running retention.
    ///
    /// # Errors
    ///
    /// Fails with `Validation` if `options.overwrite` is `false` and
    /// `new.id` already exists.
    pub async fn save(&self, new: NewCheckpoint, options: SaveOptions) -> MemoryResult<Checkpoint> {
        if !options.overwrite && self.store.exists(&new.id).await? {
            return Err(MemoryError::validation(format!("checkpoint {} already exists", new.id))
                .with_detail("id", &new.id));
        }

        let digest = compute_digest(&new.state);
        let size_bytes = crate::digest::canonicalize(&new.state).len() as u64;
        let created_at = self.clock.now().to_rfc3339();

        let checkpoint = Checkpoint {
            meta: CheckpointMeta {
                id: new.id,
                parent_id: new.parent_id,
                branch_id: new.branch_id,
                created_at,
                score: new.score,
                labels: new.labels,
                size_bytes,
            },
            state: new.state,
            digest,
        };

        self.store.upsert(checkpoint.clone()).await?;
        info!(target: "memory.checkpoint", id = %checkpoint.id(), "saved");

        if let Err(err) = self.prune().await {
            warn!(target: "memory.checkpoint", error = %err, "prune after save failed");
        }

        Ok(checkpoint)
    }

    /// Load a checkpoint by id.
    pub async fn load(&self, id: &str) -> MemoryResult<Option<Checkpoint>> {
        self.store.get(id).await
    }

    /// List checkpoints newest-first.
    pub async fn list(&self, limit: usize, cursor: Option<chrono::DateTime<chrono::Utc>>) -> MemoryResult<Page<Checkpoint>> {
        self.store.list(limit, cursor).await
    }

    /// Remove a checkpoint by id.
    pub async fn remove(&self, id: &str) -> MemoryResult<bool> {
        self.store.remove(id).await
    }

    /// Fetch the full checkpoint for the caller to replay.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` if `id` does not exist.
    pub async fn rollback(&self, id: &str) -> MemoryResult<Checkpoint> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| MemoryError::not_found(format!("no checkpoint {id}")))
    }

    /// Fan a checkpoint out into `request.count` sibling branches sharing
    /// one freshly allocated branch id.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` if `request.from` does not exist, or
    /// `Validation` if `count` is zero or exceeds `branch_budget`.
    pub async fn branch(&self, request: BranchRequest) -> MemoryResult<BranchResult> {
        let parent = self
            .store
            .get(&request.from)
            .await?
            .ok_or_else(|| MemoryError::not_found(format!("no checkpoint {}", request.from)))?;
        self.enforce_branch(request.count)?;

        let branch_id = format!("{BRANCH_ID_PREFIX}{}", uuid::Uuid::new_v4());
        let mut checkpoint_ids = Vec::with_capacity(request.count as usize);

        for _ in 0..request.count {
            let id = format!("{}{}", memory_core::CHECKPOINT_ID_PREFIX, uuid::Uuid::new_v4());
            let new = NewCheckpoint {
                id: id.clone(),
                parent_id: Some(parent.meta.id.clone()),
                branch_id: Some(branch_id.clone()),
                score: parent.meta.score,
                labels: request.labels.clone().or_else(|| parent.meta.labels.clone()),
                state: parent.state.clone(),
            };
            self.save(new, SaveOptions { overwrite: false }).await?;
            checkpoint_ids.push(id);
        }

        Ok(BranchResult {
            parent,
            branch_id,
            checkpoint_ids,
        })
    }

    /// Validate a branch fan-out count against the configured budget.
    ///
    /// # Errors
    ///
    /// Fails with `Validation` if `count` is zero or exceeds
    /// `branch_budget`.
    pub fn enforce_branch(&self, count: u32) -> MemoryResult<()> {
        if count == 0 || count > self.policy.branch_budget {
            return Err(MemoryError::validation(format!(
                "branch count {count} must be in 1..={}",
                self.policy.branch_budget
            )));
        }
        Ok(())
    }

    /// Fetch `(record, digest)` for a checkpoint.
    pub async fn snapshot(&self, id: &str) -> MemoryResult<Option<(Checkpoint, String)>> {
        Ok(self.store.get(id).await?.map(|ckpt| {
            let digest = ckpt.digest.clone();
            (ckpt, digest)
        }))
    }

    /// Fetch `(meta, state, digest)` for a checkpoint.
    pub async fn context(&self, id: &str) -> MemoryResult<Option<CheckpointContext>> {
        Ok(self.store.get(id).await?.map(|ckpt| CheckpointContext {
            meta: ckpt.meta,
            state: ckpt.state,
            digest: ckpt.digest,
        }))
    }

    /// Run the two-pass retention policy: expire by `ttl`, then trim
    /// overflow past `max_retained`. Both passes share one reading of the
    /// clock.
    pub async fn prune(&self) -> MemoryResult<usize> {
        let now = self.clock.now();
        let cutoff = now - self.policy.ttl;
        let mut removed = self.store.delete_older_than(cutoff).await?;

        let remaining = self.store.count().await?;
        if remaining > self.policy.max_retained {
            removed += self.store.delete_oldest(remaining - self.policy.max_retained).await?;
        }

        if removed > 0 {
            info!(target: "memory.checkpoint", removed, "pruned");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::ManualClock;
    use memory_record_store::InMemoryRecordStore;

    fn engine(policy: CheckpointPolicy) -> (CheckpointEngine, Arc<ManualClock>) {
        let store = Arc::new(InMemoryRecordStore::new());
        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        (CheckpointEngine::new(store, clock.clone(), policy), clock)
    }

    #[tokio::test]
    async fn save_computes_digest_and_fills_meta() {
        let (engine, _clock) = engine(CheckpointPolicy::default());
        let ckpt = engine
            .save(
                NewCheckpoint::new("ckpt_a", serde_json::json!({"x": 1})),
                SaveOptions::default(),
            )
            .await
            .unwrap();
        assert!(ckpt.digest.starts_with("sha256:"));
        assert!(ckpt.meta.size_bytes > 0);
    }

    #[tokio::test]
    async fn save_rejects_collision_without_overwrite() {
        let (engine, _clock) = engine(CheckpointPolicy::default());
        engine
            .save(NewCheckpoint::new("ckpt_a", serde_json::json!({})), SaveOptions::default())
            .await
            .unwrap();
        let err = engine
            .save(NewCheckpoint::new("ckpt_a", serde_json::json!({})), SaveOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, memory_error::MemoryErrorKind::Validation);
    }

    #[tokio::test]
    async fn save_allows_overwrite_when_requested() {
        let (engine, _clock) = engine(CheckpointPolicy::default());
        engine
            .save(NewCheckpoint::new("ckpt_a", serde_json::json!({})), SaveOptions::default())
            .await
            .unwrap();
        let result = engine
            .save(
                NewCheckpoint::new("ckpt_a", serde_json::json!({"updated": true})),
                SaveOptions { overwrite: true },
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn rollback_fails_not_found_when_missing() {
        let (engine, _clock) = engine(CheckpointPolicy::default());
        let err = engine.rollback("ckpt_missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn branch_fails_not_found_when_parent_missing() {
        let (engine, _clock) = engine(CheckpointPolicy::default());
        let err = engine
            .branch(BranchRequest {
                from: "ckpt_missing".into(),
                count: 2,
                labels: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn branch_rejects_count_over_budget() {
        let (engine, _clock) = engine(CheckpointPolicy { branch_budget: 3, ..Default::default() });
        engine
            .save(NewCheckpoint::new("ckpt_a", serde_json::json!({})), SaveOptions::default())
            .await
            .unwrap();
        let err = engine
            .branch(BranchRequest {
                from: "ckpt_a".into(),
                count: 4,
                labels: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, memory_error::MemoryErrorKind::Validation);
    }

    #[tokio::test]
    async fn branch_rejects_zero_count() {
        let (engine, _clock) = engine(CheckpointPolicy::default());
        engine
            .save(NewCheckpoint::new("ckpt_a", serde_json::json!({})), SaveOptions::default())
            .await
            .unwrap();
        let err = engine
            .branch(BranchRequest { from: "ckpt_a".into(), count: 0, labels: None })
            .await
            .unwrap_err();
        assert_eq!(err.kind, memory_error::MemoryErrorKind::Validation);
    }

    #[tokio::test]
    async fn branch_creates_siblings_with_shared_branch_id() {
        let (engine, _clock) = engine(CheckpointPolicy::default());
        engine
            .save(NewCheckpoint::new("ckpt_a", serde_json::json!({"v": 1})), SaveOptions::default())
            .await
            .unwrap();
        let result = engine
            .branch(BranchRequest { from: "ckpt_a".into(), count: 2, labels: Some(vec!["x".into()]) })
            .await
            .unwrap();
        assert_eq!(result.checkpoint_ids.len(), 2);
        for id in &result.checkpoint_ids {
            let child = engine.load(id).await.unwrap().unwrap();
            assert_eq!(child.meta.parent_id.as_deref(), Some("ckpt_a"));
            assert_eq!(child.meta.branch_id.as_deref(), Some(result.branch_id.as_str()));
            assert_eq!(child.meta.labels, Some(vec!["x".to_string()]));
        }
    }

    #[tokio::test]
    async fn prune_expires_by_ttl_then_trims_overflow() {
        let policy = CheckpointPolicy {
            max_retained: 1,
            ttl: chrono::Duration::seconds(30),
            branch_budget: 3,
        };
        let (engine, clock) = engine(policy);
        engine
            .save(NewCheckpoint::new("ckpt_old", serde_json::json!({})), SaveOptions::default())
            .await
            .unwrap();
        clock.advance(chrono::Duration::seconds(60));
        engine
            .save(NewCheckpoint::new("ckpt_new1", serde_json::json!({})), SaveOptions::default())
            .await
            .unwrap();
        engine
            .save(NewCheckpoint::new("ckpt_new2", serde_json::json!({})), SaveOptions::default())
            .await
            .unwrap();

        assert!(engine.load("ckpt_old").await.unwrap().is_none());
        let remaining = engine.list(10, None).await.unwrap();
        assert_eq!(remaining.items.len(), 1);
    }

    #[tokio::test]
    async fn snapshot_and_context_return_none_when_missing() {
        let (engine, _clock) = engine(CheckpointPolicy::default());
        assert!(engine.snapshot("ckpt_missing").await.unwrap().is_none());
        assert!(engine.context("ckpt_missing").await.unwrap().is_none());
    }
}
