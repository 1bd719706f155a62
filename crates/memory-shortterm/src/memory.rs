// SPDX-License-Identifier: MIT OR Apache-2.0
//! The C6 short-term memory layer.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use memory_checkpoint::CheckpointEngine;
use memory_core::{clamp_importance, Clock, NewMemoryRecord, Session, ShortTermEntry};
use memory_error::{MemoryError, MemoryResult};
use memory_write::{IdFactory, WriteOutcome, WriteWorkflow};
use tracing::{debug, warn};

use crate::config::ShortTermPolicy;
use crate::model::{
    FlushResult, ReversiblePointer, ShortTermSnapshot, SnapshotEntry, StoreRequest, StoreResult,
    SHORT_TERM_LAYER,
};

/// Volatile per-session scratchpads with TTL eviction and
/// importance-driven promotion into the durable record store.
pub struct ShortTermMemory {
    sessions: RwLock<HashMap<String, Session>>,
    clock: Arc<dyn Clock>,
    id_factory: Arc<dyn IdFactory>,
    write_workflow: Arc<WriteWorkflow>,
    checkpoint_engine: Arc<CheckpointEngine>,
    policy: ShortTermPolicy,
}

impl ShortTermMemory {
    /// Construct the layer over its collaborators.
    ///
    /// `id_factory` assigns entry ids without any durable side effect
    /// (the production binding); `write_workflow` is used only at
    /// promotion time, when an entry genuinely becomes a durable record.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        id_factory: Arc<dyn IdFactory>,
        write_workflow: Arc<WriteWorkflow>,
        checkpoint_engine: Arc<CheckpointEngine>,
        policy: ShortTermPolicy,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
            id_factory,
            write_workflow,
            checkpoint_engine,
            policy,
        }
    }

    /// Append an entry to a session, creating it if absent. If the
    /// entry's importance meets `promotion_importance`, the session is
    /// synchronously promoted after the append; a promotion failure here
    /// is logged, never returned — the entry has already been appended
    /// and, if promoted, already removed from the map.
    pub async fn store(&self, request: StoreRequest) -> MemoryResult<StoreResult> {
        let id = self.id_factory.next_id();
        let now = self.clock.now();
        let importance = clamp_importance(i64::from(
            request.importance.unwrap_or(memory_core::record::DEFAULT_IMPORTANCE),
        ));

        let entry = ShortTermEntry {
            id: id.clone(),
            content: request.content,
            importance,
            stored_at: now,
            metadata: request.metadata,
        };

        {
            let mut sessions = self.lock_write()?;
            let session = sessions
                .entry(request.session_id.clone())
                .or_insert_with(|| Session::new(request.session_id.clone(), now));
            session.entries.push(entry);
        }

        if importance >= self.policy.promotion_importance {
            if let Err(err) = self.promote_session(&request.session_id).await {
                warn!(target: "memory.shortterm", session_id = %request.session_id, error = %err, "synchronous promotion failed");
            }
        }

        Ok(StoreResult {
            id,
            session_id: request.session_id,
            layer: SHORT_TERM_LAYER,
            stored_at: now,
        })
    }

    /// Return a structural copy of a session, if it currently exists.
    pub fn get_session(&self, session_id: &str) -> MemoryResult<Option<Session>> {
        let sessions = self.lock_read()?;
        Ok(sessions.get(session_id).cloned())
    }

    /// Drop every entry whose `stored_at` predates `now - ttl`, across
    /// every session, in one pass sharing a single `now()` reading.
    /// Sessions that become empty are removed and their ids returned;
    /// promotion of their content, if desired, is the caller's job.
    pub async fn flush_expired(&self) -> MemoryResult<FlushResult> {
        let now = self.clock.now();
        let mut removed = 0usize;
        let mut expired_sessions = Vec::new();

        let mut sessions = self.lock_write()?;
        let mut drained = Vec::new();
        for (session_id, session) in sessions.iter_mut() {
            let before = session.entries.len();
            session.entries.retain(|e| e.is_live(now, self.policy.ttl));
            removed += before - session.entries.len();
            if session.entries.is_empty() {
                drained.push(session_id.clone());
            }
        }
        for session_id in &drained {
            sessions.remove(session_id);
        }
        expired_sessions.extend(drained);

        debug!(target: "memory.shortterm", removed, sessions = expired_sessions.len(), "flush_expired");
        Ok(FlushResult { removed, expired_sessions })
    }

    /// Remove a session and durably persist every one of its entries, in
    /// insertion order, via the write workflow. A mid-way write failure
    /// leaves the session removed (sessions are single-writer within a
    /// TTL window; a promoted session is never resurrected).
    pub async fn promote_session(&self, session_id: &str) -> MemoryResult<Vec<WriteOutcome>> {
        let session = {
            let mut sessions = self.lock_write()?;
            sessions.remove(session_id)
        };
        let Some(session) = session else {
            return Ok(Vec::new());
        };

        let mut outcomes = Vec::with_capacity(session.entries.len());
        for entry in session.entries {
            let mut input = NewMemoryRecord::new(entry.content).with_importance(entry.importance);
            if let Some(metadata) = entry.metadata {
                input.metadata.extend(metadata);
            }
            let outcome = self.write_workflow.run_store(input).await?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Reconstruct a short-term session from a checkpoint's
    /// `scratch.shortTerm` substructure, if present.
    pub async fn snapshot(&self, checkpoint_id: &str) -> MemoryResult<Option<ShortTermSnapshot>> {
        let Some(checkpoint) = self.checkpoint_engine.load(checkpoint_id).await? else {
            return Ok(None);
        };

        let Some(scratch) = checkpoint
            .state
            .get("scratch")
            .and_then(|s| s.get("shortTerm"))
        else {
            return Ok(None);
        };
        let Some(session_id) = scratch.get("sessionId").and_then(|v| v.as_str()) else {
            return Ok(None);
        };
        let Some(entries_json) = scratch.get("entries").and_then(|v| v.as_array()) else {
            return Ok(None);
        };

        let mut entries = Vec::with_capacity(entries_json.len());
        for raw in entries_json {
            let Ok(entry) = serde_json::from_value::<ShortTermEntry>(raw.clone()) else {
                continue;
            };
            entries.push(SnapshotEntry {
                entry,
                pointer: ReversiblePointer {
                    checkpoint_id: checkpoint_id.to_string(),
                    digest: checkpoint.digest.clone(),
                    layer: SHORT_TERM_LAYER,
                },
            });
        }

        Ok(Some(ShortTermSnapshot {
            session_id: session_id.to_string(),
            entries,
        }))
    }

    fn lock_read(&self) -> MemoryResult<std::sync::RwLockReadGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .read()
            .map_err(|_| MemoryError::internal("short-term session map poisoned"))
    }

    fn lock_write(&self) -> MemoryResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .write()
            .map_err(|_| MemoryError::internal("short-term session map poisoned"))
    }
}
