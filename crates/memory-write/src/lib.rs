// SPDX-License-Identifier: MIT OR Apache-2.0
//! The write workflow (C5): normalize, persist, and index a new memory
//! record.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod id_factory;
mod stages;
mod workflow;

pub use context::{WriteContext, WriteOutcome};
pub use id_factory::{IdFactory, UuidIdFactory};
pub use stages::{IndexStage, PersistStage, PrepareStage, WriteStage};
pub use workflow::WriteWorkflow;
