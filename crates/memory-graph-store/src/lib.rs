// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! The C3 external collaborator contract: typed nodes, directed typed
//! edges, and chunk references, with batched lookups for graph expansion.

pub mod memory_adapter;
pub mod traits;

pub use memory_adapter::InMemoryGraphStore;
pub use traits::{GraphStore, MAX_BATCH_SIZE};
