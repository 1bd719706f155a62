// SPDX-License-Identifier: MIT OR Apache-2.0
//! Retention policy for the checkpoint engine.

/// Checkpoint retention policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckpointPolicy {
    /// Maximum number of checkpoints kept after a prune.
    pub max_retained: usize,
    /// Maximum age of a checkpoint before it is eligible for pruning.
    pub ttl: chrono::Duration,
    /// Maximum number of checkpoints a single `branch` call may create.
    pub branch_budget: u32,
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self {
            max_retained: 20,
            ttl: chrono::Duration::hours(24),
            branch_budget: 3,
        }
    }
}
