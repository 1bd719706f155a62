// SPDX-License-Identifier: MIT OR Apache-2.0
//! Id assignment for freshly-prepared records.

/// Draws a fresh, process-unique id.
pub trait IdFactory: Send + Sync {
    /// Draw a new id.
    fn next_id(&self) -> String;
}

/// An [`IdFactory`] backed by UUIDv4.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdFactory;

impl IdFactory for UuidIdFactory {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
