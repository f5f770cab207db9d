//! Tenant scopes.
//!
//! A scope is the set of tenant/user/document identifiers constraining a
//! read, write, or delete. Every write carries a full [`DocumentScope`];
//! queries and deletes translate their scope into an equality filter.
//! A query without a `company_id` deliberately spans tenants; callers
//! opt into that by leaving the field unset.

use crate::error::{Error, Result};
use crate::index::{MetaValue, SearchFilter};

/// Identity attached to every chunk written during one ingestion.
#[derive(Debug, Clone)]
pub struct DocumentScope {
    /// Owning tenant
    pub company_id: String,
    pub user_id: Option<String>,
    /// Source document identifier
    pub pdf_id: String,
    /// Free-form source label (upload, crawler, ...)
    pub source: Option<String>,
    pub category: Option<String>,
    pub namespace: Option<String>,
}

impl DocumentScope {
    pub fn new(company_id: impl Into<String>, pdf_id: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            user_id: None,
            pdf_id: pdf_id.into(),
            source: None,
            category: None,
            namespace: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.company_id.trim().is_empty() {
            return Err(Error::Validation(
                "scope is missing a company_id".to_string(),
            ));
        }
        if self.pdf_id.trim().is_empty() {
            return Err(Error::Validation("scope is missing a pdf_id".to_string()));
        }
        Ok(())
    }

    pub fn company_value(&self) -> MetaValue {
        MetaValue::coerce(&self.company_id)
    }

    pub fn user_value(&self) -> Option<MetaValue> {
        self.user_id.as_deref().map(MetaValue::coerce)
    }
}

/// Read scope for retrieval and answering.
#[derive(Debug, Clone, Default)]
pub struct QueryScope {
    pub company_id: Option<String>,
    pub namespace: Option<String>,
    /// Overrides the pipeline's default top-K when set.
    pub top_k: Option<u64>,
}

impl QueryScope {
    pub fn for_company(company_id: impl Into<String>) -> Self {
        Self {
            company_id: Some(company_id.into()),
            ..Self::default()
        }
    }

    pub fn filter(&self) -> SearchFilter {
        let mut filter = SearchFilter::new();
        if let Some(company_id) = &self.company_id {
            filter = filter.company(company_id);
        }
        if let Some(namespace) = &self.namespace {
            filter = filter.namespace(namespace);
        }
        filter
    }
}

/// Delete scope: which tenant/namespace a document removal applies to.
#[derive(Debug, Clone, Default)]
pub struct DeleteScope {
    pub company_id: Option<String>,
    pub namespace: Option<String>,
}

impl DeleteScope {
    /// Filter for deleting all chunks of `pdf_id` within this scope.
    pub fn filter(&self, pdf_id: &str) -> SearchFilter {
        let mut filter = SearchFilter::new().pdf(pdf_id);
        if let Some(company_id) = &self.company_id {
            filter = filter.company(company_id);
        }
        if let Some(namespace) = &self.namespace {
            filter = filter.namespace(namespace);
        }
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_scope_requires_company_and_pdf() {
        assert!(DocumentScope::new("7", "pdf-1").validate().is_ok());
        assert!(DocumentScope::new("  ", "pdf-1").validate().is_err());
        assert!(DocumentScope::new("7", "").validate().is_err());
    }

    #[test]
    fn document_scope_coerces_tenant_ids() {
        let scope = DocumentScope {
            user_id: Some("not-a-number".to_string()),
            ..DocumentScope::new("42", "pdf-1")
        };

        assert_eq!(scope.company_value(), MetaValue::Int(42));
        assert_eq!(
            scope.user_value(),
            Some(MetaValue::Str("not-a-number".to_string()))
        );
    }

    #[test]
    fn query_scope_without_company_spans_tenants() {
        let scope = QueryScope::default();
        assert!(scope.filter().is_empty());
    }

    #[test]
    fn query_scope_filter_carries_company_and_namespace() {
        let scope = QueryScope {
            company_id: Some("9".to_string()),
            namespace: Some("prod".to_string()),
            top_k: None,
        };

        let filter = scope.filter();
        assert_eq!(filter.company_id, Some(MetaValue::Int(9)));
        assert_eq!(filter.namespace.as_deref(), Some("prod"));
        assert!(filter.pdf_id.is_none());
    }

    #[test]
    fn delete_scope_filter_always_includes_pdf() {
        let filter = DeleteScope::default().filter("pdf-x");
        assert_eq!(filter.pdf_id.as_deref(), Some("pdf-x"));
        assert!(filter.company_id.is_none());

        let scoped = DeleteScope {
            company_id: Some("3".to_string()),
            namespace: None,
        }
        .filter("pdf-x");
        assert_eq!(scoped.company_id, Some(MetaValue::Int(3)));
    }
}
