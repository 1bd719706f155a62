// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! The C2 external collaborator contract: a dense (+ optional sparse)
//! vector collection with filtered search and batch upsert.

pub mod memory_adapter;
pub mod types;

pub use memory_adapter::InMemoryVectorStore;
pub use types::{
    Distance, ScrollPage, SearchHit, SearchRequest, SparseVector, VectorPoint, VectorStore,
};
