// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! The C1 external collaborator contract: a durable mapping from record id
//! to [`memory_core::MemoryRecord`], full-text search, and the
//! `checkpoints` / `memory_relationships` tables sharing the same backend.

pub mod filter;
pub mod memory_adapter;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use filter::{has_at_least_one_scoping_filter, matches_all, RecordFilter};
pub use memory_adapter::InMemoryRecordStore;
pub use traits::{CheckpointStore, Page, RecordStore, RelationshipRecord, RelationshipStore};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRecordStore;
