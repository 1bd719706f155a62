// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unified error taxonomy for the agentic memory store.
//!
//! Every error raised by a memory-store component carries a [`MemoryErrorKind`]
//! (a stable, wire-visible tag), a human-readable message, an optional cause
//! chain, and arbitrary structured context. Adapters must wrap their own
//! errors at the boundary — no adapter-internal error type crosses a crate
//! line unwrapped.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// MemoryErrorKind
// ---------------------------------------------------------------------------

/// Wire-visible error taxonomy.
///
/// See the error handling design: `Validation`/`NotFound`/`Storage` surface
/// to the caller; `Index` is swallowed by the write workflow; `Network`
/// degrades retrieval to keyword search; `Timeout` and `Internal` surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoryErrorKind {
    /// Missing checkpoint, unknown record id, or other absent resource.
    NotFound,
    /// Malformed input, missing mandatory filter, branch budget exceeded.
    Validation,
    /// Record-store write/read failure. Never retried automatically.
    Storage,
    /// Transient vector-store or embedding-provider unreachable.
    Network,
    /// Vector upsert failure. Swallowed by the write workflow.
    Index,
    /// Invariant violation: missing embedding backend, logic bug.
    Internal,
    /// A query or call exceeded its configured deadline.
    Timeout,
}

impl MemoryErrorKind {
    /// Stable `&'static str` wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION",
            Self::Storage => "STORAGE",
            Self::Network => "NETWORK",
            Self::Index => "INDEX",
            Self::Internal => "INTERNAL",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for MemoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MemoryError
// ---------------------------------------------------------------------------

/// Unified memory-store error.
///
/// # Examples
///
/// ```
/// use memory_error::{MemoryError, MemoryErrorKind};
///
/// let err = MemoryError::new(MemoryErrorKind::Validation, "missing filter")
///     .with_detail("field", "domain");
/// assert_eq!(err.kind, MemoryErrorKind::Validation);
/// ```
pub struct MemoryError {
    /// Machine-readable error kind.
    pub kind: MemoryErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics.
    pub details: BTreeMap<String, serde_json::Value>,
}

impl MemoryError {
    /// Create a new error with the given kind and message.
    pub fn new(kind: MemoryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            details: BTreeMap::new(),
        }
    }

    /// Shorthand for `MemoryError::new(MemoryErrorKind::NotFound, ..)`.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(MemoryErrorKind::NotFound, message)
    }

    /// Shorthand for `MemoryError::new(MemoryErrorKind::Validation, ..)`.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(MemoryErrorKind::Validation, message)
    }

    /// Shorthand for `MemoryError::new(MemoryErrorKind::Storage, ..)`.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(MemoryErrorKind::Storage, message)
    }

    /// Shorthand for `MemoryError::new(MemoryErrorKind::Network, ..)`.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(MemoryErrorKind::Network, message)
    }

    /// Shorthand for `MemoryError::new(MemoryErrorKind::Index, ..)`.
    pub fn index(message: impl Into<String>) -> Self {
        Self::new(MemoryErrorKind::Index, message)
    }

    /// Shorthand for `MemoryError::new(MemoryErrorKind::Internal, ..)`.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(MemoryErrorKind::Internal, message)
    }

    /// Shorthand for `MemoryError::new(MemoryErrorKind::Timeout, ..)`.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(MemoryErrorKind::Timeout, message)
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialisation
    /// fails, the entry is silently skipped.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.details.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns `true` if this error's kind is [`MemoryErrorKind::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == MemoryErrorKind::NotFound
    }
}

impl fmt::Debug for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("MemoryError");
        d.field("kind", &self.kind);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.details.is_empty() {
            d.field("details", &self.details);
        }
        d.finish()
    }
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)?;
        if !self.details.is_empty()
            && let Ok(ctx) = serde_json::to_string(&self.details)
        {
            write!(f, " {ctx}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MemoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Convenience alias used throughout the memory-store crates.
pub type MemoryResult<T> = Result<T, MemoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn display_without_details() {
        let err = MemoryError::not_found("no such checkpoint");
        assert_eq!(err.to_string(), "[NOT_FOUND] no such checkpoint");
    }

    #[test]
    fn display_with_details() {
        let err = MemoryError::validation("missing filter").with_detail("field", "domain");
        let s = err.to_string();
        assert!(s.starts_with("[VALIDATION] missing filter"));
        assert!(s.contains("field"));
        assert!(s.contains("domain"));
    }

    #[test]
    fn debug_with_source() {
        let src = io::Error::new(io::ErrorKind::NotFound, "file missing");
        let err = MemoryError::storage("write failed").with_source(src);
        let dbg = format!("{err:?}");
        assert!(dbg.contains("source"));
        assert!(dbg.contains("file missing"));
    }

    #[test]
    fn is_not_found_shorthand() {
        assert!(MemoryError::not_found("x").is_not_found());
        assert!(!MemoryError::internal("x").is_not_found());
    }

    #[test]
    fn error_kind_serde_roundtrip() {
        let kind = MemoryErrorKind::Timeout;
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, r#""TIMEOUT""#);
        let back: MemoryErrorKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }

    #[test]
    fn std_error_source_chain() {
        let inner = io::Error::new(io::ErrorKind::BrokenPipe, "pipe broke");
        let err = MemoryError::network("upstream gone").with_source(inner);
        let src = std::error::Error::source(&err).unwrap();
        assert_eq!(src.to_string(), "pipe broke");
    }

    #[test]
    fn all_kinds_have_unique_as_str() {
        let kinds = [
            MemoryErrorKind::NotFound,
            MemoryErrorKind::Validation,
            MemoryErrorKind::Storage,
            MemoryErrorKind::Network,
            MemoryErrorKind::Index,
            MemoryErrorKind::Internal,
            MemoryErrorKind::Timeout,
        ];
        let mut seen = std::collections::HashSet::new();
        for k in kinds {
            assert!(seen.insert(k.as_str()));
        }
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn context_with_nested_json() {
        let err = MemoryError::internal("nested")
            .with_detail("details", serde_json::json!({"a": 1, "b": [2, 3]}));
        assert_eq!(
            err.details["details"],
            serde_json::json!({"a": 1, "b": [2, 3]})
        );
    }
}
