// SPDX-License-Identifier: MIT OR Apache-2.0
//! The checkpoint engine (C7): content-addressed snapshots of agent state
//! with parent/branch lineage and retention.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod digest;
mod engine;
mod model;

pub use config::CheckpointPolicy;
pub use digest::{canonicalize, compute_digest, verify_digest};
pub use engine::CheckpointEngine;
pub use model::{BranchRequest, BranchResult, CheckpointContext, NewCheckpoint, SaveOptions};
