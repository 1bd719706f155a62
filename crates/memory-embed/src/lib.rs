// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! The C4 external collaborator contract: dense and sparse embedding
//! functions over text. Embedding-model ownership is out of scope; this
//! crate only defines the trait and a deterministic test double.

pub mod mock;
pub mod traits;

pub use mock::DeterministicMockEmbedder;
pub use traits::EmbeddingProvider;
