// SPDX-License-Identifier: MIT OR Apache-2.0
//! The per-query state machine, recorded as a plain enum matched with
//! `match` rather than a type-state generic.

/// A query's current stage. Any stage failure transitions directly to
/// [`QueryStage::Released`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    /// An admission slot has been reserved and a query id assigned.
    Reserved,
    /// Seed search (semantic, hybrid, or FTS fallback) has completed.
    Searched,
    /// Seed hits have been lifted to graph focus nodes.
    Lifted,
    /// One-hop (or multi-hop) neighbor expansion has completed.
    Expanded,
    /// Context chunks have been fetched, sorted, and deduplicated.
    Assembled,
    /// Citations have been formatted, if requested.
    Cited,
    /// The admission slot has been released; the query is complete.
    Released,
}

impl QueryStage {
    /// Human-readable name used on the query's tracing span.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserved => "reserved",
            Self::Searched => "searched",
            Self::Lifted => "lifted",
            Self::Expanded => "expanded",
            Self::Assembled => "assembled",
            Self::Cited => "cited",
            Self::Released => "released",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_stage_has_a_name() {
        let stages = [
            QueryStage::Reserved,
            QueryStage::Searched,
            QueryStage::Lifted,
            QueryStage::Expanded,
            QueryStage::Assembled,
            QueryStage::Cited,
            QueryStage::Released,
        ];
        for stage in stages {
            assert!(!stage.as_str().is_empty());
        }
    }
}
