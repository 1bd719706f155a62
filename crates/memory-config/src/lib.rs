// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for the memory store.
//!
//! [`MemoryConfig`] is the top-level runtime configuration; [`load_config`]
//! reads it from an optional TOML file plus environment overrides, and
//! [`validate_config`] applies hard validation alongside advisory
//! [`ConfigWarning`]s (a `hybrid_weight` outside `[0, 1]` is clamped with a
//! warning rather than rejected).
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

/// Advisory-level issues that do not prevent operation but deserve
/// attention.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// A configured TTL is unusually large.
    LargeTtl {
        /// Which TTL this is (`short_term.ttl_ms` or `checkpoint.ttl_ms`).
        field: String,
        /// The configured value, in milliseconds.
        ms: u64,
    },
    /// A fractional value outside `[0, 1]` was clamped into range.
    ClampedToUnitInterval {
        /// Field name.
        field: String,
        /// The value as originally configured.
        original: f64,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            Self::LargeTtl { field, ms } => {
                write!(f, "'{field}' is unusually large ({ms}ms)")
            }
            Self::ClampedToUnitInterval { field, original } => {
                write!(f, "'{field}' ({original}) was outside [0, 1] and has been clamped")
            }
        }
    }
}

/// Vector-store connection and collection settings.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct VectorStoreConfig {
    /// Backend URL.
    pub url: String,
    /// Optional API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Collection name.
    pub collection: String,
    /// Dense embedding dimension.
    pub embed_dim: usize,
    /// Distance metric name (`"cosine"`, `"dot"`, or `"euclid"`).
    pub similarity: String,
    /// Per-call timeout, in milliseconds.
    #[serde(default = "default_vector_store_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_vector_store_timeout_ms() -> u64 {
    5_000
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: None,
            collection: "memories".to_string(),
            embed_dim: 768,
            similarity: "cosine".to_string(),
            timeout_ms: default_vector_store_timeout_ms(),
        }
    }
}

/// Short-term layer settings (C6).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ShortTermConfig {
    /// Entry time-to-live, in milliseconds.
    pub ttl_ms: u64,
    /// Importance at or above which `store` synchronously promotes.
    pub promotion_importance: u8,
}

impl Default for ShortTermConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 300_000,
            promotion_importance: 8,
        }
    }
}

/// Checkpoint engine settings (C7).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct CheckpointConfig {
    /// Maximum checkpoints retained per prune pass.
    pub max_retained: usize,
    /// Checkpoint time-to-live, in milliseconds.
    pub ttl_ms: u64,
    /// Maximum checkpoints a single `branch` call may create.
    pub branch_budget: u32,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            max_retained: 20,
            ttl_ms: 86_400_000,
            branch_budget: 3,
        }
    }
}

/// Retrieval pipeline result-size and concurrency limits (C8).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct LimitsConfig {
    /// Maximum queries admitted concurrently.
    pub max_concurrent_queries: usize,
    /// Maximum chunks in an assembled context.
    pub max_context_chunks: usize,
    /// Per-query deadline, in milliseconds.
    pub query_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_queries: 5,
            max_context_chunks: 24,
            query_timeout_ms: 30_000,
        }
    }
}

/// Top-level runtime configuration for the memory store.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct MemoryConfig {
    /// Filesystem path (or connection string) for the record store.
    #[serde(default)]
    pub record_store_path: String,
    /// Vector-store settings.
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    /// Short-term layer settings.
    #[serde(default)]
    pub short_term: ShortTermConfig,
    /// Checkpoint engine settings.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    /// Retrieval pipeline limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Default similarity score threshold for pure semantic queries.
    #[serde(default = "default_threshold")]
    pub default_threshold: f32,
    /// Hybrid score weight α applied to the semantic component.
    #[serde(default = "default_hybrid_weight")]
    pub hybrid_weight: f64,
    /// Bounded concurrency of the write-indexing background queue.
    #[serde(default = "default_queue_concurrency")]
    pub queue_concurrency: usize,
    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

fn default_threshold() -> f32 {
    0.5
}

fn default_hybrid_weight() -> f64 {
    0.6
}

fn default_queue_concurrency() -> usize {
    4
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            record_store_path: String::new(),
            vector_store: VectorStoreConfig::default(),
            short_term: ShortTermConfig::default(),
            checkpoint: CheckpointConfig::default(),
            limits: LimitsConfig::default(),
            default_threshold: default_threshold(),
            hybrid_weight: default_hybrid_weight(),
            queue_concurrency: default_queue_concurrency(),
            log_level: Some("info".to_string()),
        }
    }
}

const LARGE_TTL_THRESHOLD_MS: u64 = 7 * 24 * 60 * 60 * 1000;
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Load a [`MemoryConfig`] from an optional TOML file path, falling back to
/// [`MemoryConfig::default()`] when `path` is `None`. Environment overrides
/// are applied on top in both cases.
///
/// # Errors
///
/// Returns [`ConfigError::FileNotFound`] if `path` is given but unreadable,
/// or [`ConfigError::ParseError`] if its contents aren't valid TOML.
pub fn load_config(path: Option<&Path>) -> Result<MemoryConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => MemoryConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`MemoryConfig`].
///
/// # Errors
///
/// Returns [`ConfigError::ParseError`] if `content` isn't valid TOML or
/// doesn't match the expected shape.
pub fn parse_toml(content: &str) -> Result<MemoryConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError { reason: e.to_string() })
}

/// Apply environment variable overrides.
///
/// Recognised variables: `MEMORY_RECORD_STORE_PATH`, `MEMORY_VECTOR_STORE_URL`,
/// `MEMORY_LOG_LEVEL`.
pub fn apply_env_overrides(config: &mut MemoryConfig) {
    if let Ok(val) = std::env::var("MEMORY_RECORD_STORE_PATH") {
        config.record_store_path = val;
    }
    if let Ok(val) = std::env::var("MEMORY_VECTOR_STORE_URL") {
        config.vector_store.url = val;
    }
    if let Ok(val) = std::env::var("MEMORY_LOG_LEVEL") {
        config.log_level = Some(val);
    }
}

/// Validate a configuration in place, clamping out-of-range fractional
/// values (`hybrid_weight`, `default_threshold`) into `[0, 1]` and emitting
/// a warning for each, then returning every other advisory warning
/// (unusually large TTLs, a missing vector-store API key).
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] for hard failures: an invalid
/// `log_level`, an empty `vector_store.collection`, a zero `embed_dim`, or
/// a `checkpoint.branch_budget` of zero.
pub fn validate_config(config: &mut MemoryConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if let Some(level) = &config.log_level
        && !VALID_LOG_LEVELS.contains(&level.as_str())
    {
        errors.push(format!("invalid log_level '{level}'"));
    }
    if config.vector_store.collection.trim().is_empty() {
        errors.push("vector_store.collection must not be empty".to_string());
    }
    if config.vector_store.embed_dim == 0 {
        errors.push("vector_store.embed_dim must be greater than zero".to_string());
    }
    if config.checkpoint.branch_budget == 0 {
        errors.push("checkpoint.branch_budget must be at least one".to_string());
    }

    if !(0.0..=1.0).contains(&config.hybrid_weight) {
        warnings.push(ConfigWarning::ClampedToUnitInterval {
            field: "hybrid_weight".to_string(),
            original: config.hybrid_weight,
        });
        config.hybrid_weight = config.hybrid_weight.clamp(0.0, 1.0);
    }
    if !(0.0..=1.0).contains(&config.default_threshold) {
        warnings.push(ConfigWarning::ClampedToUnitInterval {
            field: "default_threshold".to_string(),
            original: f64::from(config.default_threshold),
        });
        config.default_threshold = config.default_threshold.clamp(0.0, 1.0);
    }

    if config.short_term.ttl_ms > LARGE_TTL_THRESHOLD_MS {
        warnings.push(ConfigWarning::LargeTtl {
            field: "short_term.ttl_ms".to_string(),
            ms: config.short_term.ttl_ms,
        });
    }
    if config.checkpoint.ttl_ms > LARGE_TTL_THRESHOLD_MS {
        warnings.push(ConfigWarning::LargeTtl {
            field: "checkpoint.ttl_ms".to_string(),
            ms: config.checkpoint.ttl_ms,
        });
    }
    if config.vector_store.api_key.is_none() {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "vector_store.api_key".to_string(),
            hint: "connecting to an unauthenticated vector store".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

/// Merge two configurations. Values in `overlay` take precedence; `overlay`
/// fields still at their serde default are treated as unset and the base
/// value is kept. Because every field has a default, a caller wanting a
/// hard override should always set the field explicitly.
#[must_use]
pub fn merge_configs(base: MemoryConfig, overlay: MemoryConfig) -> MemoryConfig {
    MemoryConfig {
        record_store_path: non_empty_or(overlay.record_store_path, base.record_store_path),
        vector_store: VectorStoreConfig {
            url: non_empty_or(overlay.vector_store.url, base.vector_store.url),
            api_key: overlay.vector_store.api_key.or(base.vector_store.api_key),
            collection: non_empty_or(overlay.vector_store.collection, base.vector_store.collection),
            embed_dim: if overlay.vector_store.embed_dim != 0 {
                overlay.vector_store.embed_dim
            } else {
                base.vector_store.embed_dim
            },
            similarity: non_empty_or(overlay.vector_store.similarity, base.vector_store.similarity),
            timeout_ms: overlay.vector_store.timeout_ms,
        },
        short_term: overlay.short_term,
        checkpoint: overlay.checkpoint,
        limits: overlay.limits,
        default_threshold: overlay.default_threshold,
        hybrid_weight: overlay.hybrid_weight,
        queue_concurrency: overlay.queue_concurrency,
        log_level: overlay.log_level.or(base.log_level),
    }
}

fn non_empty_or(overlay: String, base: String) -> String {
    if overlay.is_empty() { base } else { overlay }
}
