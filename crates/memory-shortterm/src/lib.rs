// SPDX-License-Identifier: MIT OR Apache-2.0
//! The short-term memory layer (C6): volatile per-session scratchpads
//! with TTL eviction and importance-driven promotion.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod memory;
mod model;

pub use config::ShortTermPolicy;
pub use memory::ShortTermMemory;
pub use model::{
    FlushResult, ReversiblePointer, ShortTermSnapshot, SnapshotEntry, StoreRequest, StoreResult,
    SHORT_TERM_LAYER,
};
