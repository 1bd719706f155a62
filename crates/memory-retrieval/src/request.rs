// SPDX-License-Identifier: MIT OR Apache-2.0
//! The inbound query request and its search-mode tag.

/// How a query should source its seed hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    /// Dense (+ sparse if meaningful) vector search only.
    Semantic,
    /// Full-text search over the record store only.
    Keyword,
    /// Vector search reordered by a blend of semantic and keyword score.
    Hybrid,
}

/// A retrieval request.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Natural-language question, embedded (for semantic/hybrid) and
    /// used verbatim for FTS.
    pub question: String,
    /// Domain scoping filter.
    pub domain: Option<String>,
    /// Tag scoping filter (any-match).
    pub tags: Vec<String>,
    /// Tenant scoping filter.
    pub tenant: Option<String>,
    /// Label scoping filter (all must be present).
    pub labels: Vec<String>,
    /// Search mode.
    pub search_type: SearchType,
    /// Number of top results requested.
    pub k: usize,
    /// Results to skip before returning, applied after seed search.
    pub offset: usize,
    /// Overrides `limits.max_context_chunks` when smaller.
    pub max_chunks: Option<usize>,
    /// Whether to produce a citation per source.
    pub include_citations: bool,
    /// Overrides the configured default similarity threshold.
    pub score_threshold: Option<f32>,
}

impl QueryRequest {
    /// Start building a request with every scoping filter empty.
    #[must_use]
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            domain: None,
            tags: Vec::new(),
            tenant: None,
            labels: Vec::new(),
            search_type: SearchType::Hybrid,
            k: 10,
            offset: 0,
            max_chunks: None,
            include_citations: false,
            score_threshold: None,
        }
    }

    /// Set the tenant filter (builder style).
    #[must_use]
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Set the domain filter (builder style).
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Append a tag filter (builder style).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the search mode (builder style).
    #[must_use]
    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    /// Set `k` (builder style).
    #[must_use]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Request citations (builder style).
    #[must_use]
    pub fn with_citations(mut self) -> Self {
        self.include_citations = true;
        self
    }

    /// Returns `true` iff the request carries at least one scoping
    /// filter (domain, non-empty tags, tenant, non-empty labels).
    #[must_use]
    pub fn has_scoping_filter(&self) -> bool {
        self.domain.is_some() || !self.tags.is_empty() || self.tenant.is_some() || !self.labels.is_empty()
    }

    /// Translate the request's scoping filters into the shared
    /// [`memory_record_store::RecordFilter`] sum type used by both the
    /// vector-store and FTS search paths.
    #[must_use]
    pub fn record_filters(&self) -> Vec<memory_record_store::RecordFilter> {
        let mut filters = Vec::new();
        if let Some(domain) = &self.domain {
            filters.push(memory_record_store::RecordFilter::Domain(domain.clone()));
        }
        if !self.tags.is_empty() {
            filters.push(memory_record_store::RecordFilter::TagsAny(self.tags.clone()));
        }
        if let Some(tenant) = &self.tenant {
            filters.push(memory_record_store::RecordFilter::Tenant(tenant.clone()));
        }
        for label in &self.labels {
            filters.push(memory_record_store::RecordFilter::LabelAll(label.clone()));
        }
        filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_with_no_filters_has_no_scoping_filter() {
        let req = QueryRequest::new("what happened");
        assert!(!req.has_scoping_filter());
    }

    #[test]
    fn request_with_tenant_has_scoping_filter() {
        let req = QueryRequest::new("what happened").with_tenant("tenant-a");
        assert!(req.has_scoping_filter());
    }

    #[test]
    fn record_filters_translate_every_scoping_field() {
        let req = QueryRequest::new("q")
            .with_domain("ops")
            .with_tag("alpha")
            .with_tenant("tenant-a");
        let filters = req.record_filters();
        assert_eq!(filters.len(), 3);
    }
}
