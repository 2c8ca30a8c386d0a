//! List query parameters and the request they turn into.
//!
//! A [`ListQuery`] always maps to exactly one [`ListRequest`]: the default
//! listing when no sort is set, the sorted listing otherwise. The other
//! request is never constructed.

use serde::Serialize;

use crate::filter::QueryPayload;

pub mod selector;
pub mod sort;

pub use selector::{FetchOutcome, FetchTicket, FetchToken, ListQuerySelector, ListView};
pub use sort::{SortOrder, SortSpec};

/// Default page size when none is configured
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Pagination, filter and sort parameters for the ticket list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    pub filters: QueryPayload,
    pub sort: Option<SortSpec>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            filters: QueryPayload::new(),
            sort: None,
        }
    }
}

impl ListQuery {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Default::default()
        }
    }

    /// The single request this query resolves to
    pub fn request(&self) -> ListRequest {
        match &self.sort {
            None => ListRequest::Default {
                page: self.page,
                page_size: self.page_size,
                filters: self.filters.clone(),
            },
            Some(sort) => ListRequest::Sorted {
                sort: sort.clone(),
                page: self.page,
                page_size: self.page_size,
            },
        }
    }
}

/// A backend request on one of the two list paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "path", rename_all = "lowercase")]
pub enum ListRequest {
    /// Default ordering, server-side filtered
    Default {
        page: u32,
        page_size: u32,
        filters: QueryPayload,
    },
    /// Explicit sort; this endpoint takes no filters
    Sorted {
        sort: SortSpec,
        page: u32,
        page_size: u32,
    },
}

impl ListRequest {
    pub fn page(&self) -> u32 {
        match self {
            ListRequest::Default { page, .. } | ListRequest::Sorted { page, .. } => *page,
        }
    }

    pub fn page_size(&self) -> u32 {
        match self {
            ListRequest::Default { page_size, .. } | ListRequest::Sorted { page_size, .. } => {
                *page_size
            }
        }
    }

    pub fn is_sorted(&self) -> bool {
        matches!(self, ListRequest::Sorted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterClause, FilterValue};
    use crate::schema::Operator;

    #[test]
    fn test_query_without_sort_uses_default_path() {
        let mut query = ListQuery::new(25);
        query.filters.insert(
            "status".into(),
            FilterClause {
                operator: Operator::Equals,
                value: FilterValue::from("open"),
            },
        );
        match query.request() {
            ListRequest::Default {
                page,
                page_size,
                filters,
            } => {
                assert_eq!(page, 1);
                assert_eq!(page_size, 25);
                assert_eq!(filters.len(), 1);
            }
            other => panic!("expected default path, got {other:?}"),
        }
    }

    #[test]
    fn test_query_with_sort_uses_sorted_path() {
        let query = ListQuery {
            sort: Some(SortSpec::desc("priority")),
            page: 3,
            ..Default::default()
        };
        let request = query.request();
        assert!(request.is_sorted());
        assert_eq!(request.page(), 3);
        assert_eq!(request.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        assert_eq!(ListQuery::new(0).page_size, 1);
    }
}
