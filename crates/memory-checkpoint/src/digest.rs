// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canonicalization and content-addressed hashing of checkpoint state.

use sha2::{Digest as _, Sha256};

/// Produce the canonical JSON representation of a checkpoint's state.
///
/// `serde_json` serializes maps via `BTreeMap` ordering internally, so
/// key order is already deterministic; this function exists as the single
/// named place that documents the contract digest callers rely on.
#[must_use]
pub fn canonicalize(state: &serde_json::Value) -> String {
    serde_json::to_string(state).unwrap_or_else(|_| "null".to_string())
}

/// Compute the `sha256:<hex>` digest of a checkpoint's canonicalized state.
#[must_use]
pub fn compute_digest(state: &serde_json::Value) -> String {
    let canonical = canonicalize(state);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}

/// Returns `true` if `digest` matches the recomputed digest of `state`.
#[must_use]
pub fn verify_digest(state: &serde_json::Value, digest: &str) -> bool {
    compute_digest(state) == digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        let state = serde_json::json!({"b": 2, "a": 1});
        assert_eq!(compute_digest(&state), compute_digest(&state));
    }

    #[test]
    fn digest_has_sha256_prefix_and_length() {
        let digest = compute_digest(&serde_json::json!({"x": 1}));
        assert!(digest.starts_with("sha256:"));
        assert_eq!(digest.len(), "sha256:".len() + 64);
    }

    #[test]
    fn verify_digest_detects_tampering() {
        let state = serde_json::json!({"x": 1});
        let digest = compute_digest(&state);
        assert!(verify_digest(&state, &digest));
        assert!(!verify_digest(&state, "sha256:tampered"));
    }

    #[test]
    fn key_order_does_not_affect_digest() {
        let a = serde_json::json!({"a": 1, "b": 2});
        let b = serde_json::json!({"b": 2, "a": 1});
        assert_eq!(compute_digest(&a), compute_digest(&b));
    }
}
