// SPDX-License-Identifier: MIT OR Apache-2.0
//! Policy for TTL eviction and importance-driven promotion.

/// Short-term layer policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortTermPolicy {
    /// Entries older than this are dropped by `flush_expired`.
    pub ttl: chrono::Duration,
    /// Minimum importance that triggers synchronous promotion on `store`.
    pub promotion_importance: u8,
}

impl Default for ShortTermPolicy {
    fn default() -> Self {
        Self {
            ttl: chrono::Duration::milliseconds(300_000),
            promotion_importance: 8,
        }
    }
}
