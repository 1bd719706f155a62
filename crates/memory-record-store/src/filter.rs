// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed filter builder, replacing free-form record maps for query filters.
//!
//! Every literal a caller supplies is carried as data, never interpolated
//! into a query string; each adapter is responsible for translating a
//! [`RecordFilter`] into its own parameterized query language.

use memory_core::MemoryRecord;
use serde::{Deserialize, Serialize};

/// One `must`-conjunct of a record query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordFilter {
    /// Record's domain equals this value.
    Domain(String),
    /// Record's tag set contains at least one of these values.
    TagsAny(Vec<String>),
    /// Record's `metadata.tenant` equals this value.
    Tenant(String),
    /// Record's `metadata.labels` contains this value.
    LabelAll(String),
}

impl RecordFilter {
    /// Evaluate this filter against a record, for the in-memory adapter.
    #[must_use]
    pub fn matches(&self, record: &MemoryRecord) -> bool {
        match self {
            Self::Domain(domain) => record.domain.as_deref() == Some(domain.as_str()),
            Self::TagsAny(tags) => tags.iter().any(|t| record.tags.contains(t)),
            Self::Tenant(tenant) => record.tenant() == Some(tenant.as_str()),
            Self::LabelAll(label) => record
                .metadata
                .get("labels")
                .and_then(|v| v.as_array())
                .is_some_and(|labels| {
                    labels
                        .iter()
                        .any(|l| l.as_str() == Some(label.as_str()))
                }),
        }
    }
}

/// `true` iff every filter in `filters` matches `record` (`must`-AND).
#[must_use]
pub fn matches_all(filters: &[RecordFilter], record: &MemoryRecord) -> bool {
    filters.iter().all(|f| f.matches(record))
}

/// `true` iff `filters` carries at least one of domain, non-empty tags,
/// tenant, or non-empty label — the retrieval pipeline's search guard.
#[must_use]
pub fn has_at_least_one_scoping_filter(filters: &[RecordFilter]) -> bool {
    filters.iter().any(|f| match f {
        RecordFilter::Domain(_) | RecordFilter::Tenant(_) | RecordFilter::LabelAll(_) => true,
        RecordFilter::TagsAny(tags) => !tags.is_empty(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use memory_core::NewMemoryRecord;

    fn record() -> MemoryRecord {
        let new = NewMemoryRecord::new("hello")
            .with_domain("alpha")
            .with_tag("beta")
            .with_metadata("tenant", "tenant-a")
            .with_metadata("labels", serde_json::json!(["vip"]));
        MemoryRecord::from_new(new, "id1", Utc::now())
    }

    #[test]
    fn domain_filter_matches() {
        assert!(RecordFilter::Domain("alpha".into()).matches(&record()));
        assert!(!RecordFilter::Domain("other".into()).matches(&record()));
    }

    #[test]
    fn tags_any_filter_matches() {
        assert!(RecordFilter::TagsAny(vec!["beta".into(), "gamma".into()]).matches(&record()));
        assert!(!RecordFilter::TagsAny(vec!["gamma".into()]).matches(&record()));
    }

    #[test]
    fn tenant_filter_matches() {
        assert!(RecordFilter::Tenant("tenant-a".into()).matches(&record()));
    }

    #[test]
    fn label_all_filter_matches() {
        assert!(RecordFilter::LabelAll("vip".into()).matches(&record()));
        assert!(!RecordFilter::LabelAll("other".into()).matches(&record()));
    }

    #[test]
    fn empty_filter_list_rejected_by_scoping_guard() {
        assert!(!has_at_least_one_scoping_filter(&[]));
        assert!(!has_at_least_one_scoping_filter(&[RecordFilter::TagsAny(vec![])]));
        assert!(has_at_least_one_scoping_filter(&[RecordFilter::Domain("d".into())]));
    }

    #[test]
    fn matches_all_requires_every_filter() {
        let filters = vec![RecordFilter::Domain("alpha".into()), RecordFilter::Tenant("tenant-a".into())];
        assert!(matches_all(&filters, &record()));
        let filters = vec![RecordFilter::Domain("alpha".into()), RecordFilter::Tenant("other".into())];
        assert!(!matches_all(&filters, &record()));
    }
}
