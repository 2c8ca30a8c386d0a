//! Chooses and drives one of the two list paths.
//!
//! The selector never performs I/O itself. A caller asks it for the next
//! request with [`ListQuerySelector::begin_fetch`], runs that request against
//! the backend, and hands the result back with [`ListQuerySelector::resolve`].
//! Each request carries a [`FetchToken`]; only the most recently issued token
//! is accepted, so responses that arrive out of order or after a parameter
//! change are dropped.

use crate::error::Result;
use crate::filter::QueryPayload;
use crate::types::{ListPage, TicketNumber};

use super::{ListQuery, ListRequest, SortSpec};

/// Identifies one issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchToken(u64);

/// A request the caller should send, tagged with its token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub token: FetchToken,
    pub request: ListRequest,
}

/// What happened to a response handed to [`ListQuerySelector::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page is now displayed
    Applied,
    /// The fetch failed; previous data (if for the same key) stays visible
    Failed(String),
    /// The response belonged to a superseded fetch and was discarded
    Stale,
}

/// Unified, path-independent view of the current page
#[derive(Debug, Clone, Copy)]
pub struct ListView<'a> {
    /// Data for the current request key, or `None` while it loads
    pub data: Option<&'a ListPage>,
    pub is_fetching: bool,
    pub error: Option<&'a str>,
}

#[derive(Debug, Clone)]
struct Pending {
    token: FetchToken,
    request: ListRequest,
}

#[derive(Debug, Clone)]
struct Loaded {
    request: ListRequest,
    page: ListPage,
}

#[derive(Debug, Clone)]
pub struct ListQuerySelector {
    query: ListQuery,
    next_token: u64,
    pending: Option<Pending>,
    loaded: Option<Loaded>,
    error: Option<String>,
    needs_fetch: bool,
}

impl Default for ListQuerySelector {
    fn default() -> Self {
        Self::new(ListQuery::default())
    }
}

impl ListQuerySelector {
    pub fn new(query: ListQuery) -> Self {
        Self {
            query,
            next_token: 0,
            pending: None,
            loaded: None,
            error: None,
            needs_fetch: true,
        }
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn page(&self) -> u32 {
        self.query.page
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.query.sort.as_ref()
    }

    pub fn filters(&self) -> &QueryPayload {
        &self.query.filters
    }

    pub fn is_sorted(&self) -> bool {
        self.query.sort.is_some()
    }

    /// The request the live path would send right now
    pub fn current_request(&self) -> ListRequest {
        self.query.request()
    }

    /// Whether parameters changed since the last fetch was issued
    pub fn needs_fetch(&self) -> bool {
        self.needs_fetch
    }

    pub fn is_fetching(&self) -> bool {
        self.pending.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Move to another page. This is the only change that keeps the page.
    pub fn set_page(&mut self, page: u32) {
        let page = page.max(1);
        if page == self.query.page {
            return;
        }
        self.query.page = page;
        self.invalidate();
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        let page_size = page_size.max(1);
        if page_size == self.query.page_size {
            return;
        }
        self.query.page_size = page_size;
        self.query.page = 1;
        self.invalidate();
    }

    /// Replace the filter payload. The sorted path ignores filters, but they
    /// are kept so the default path picks them up again when sort clears.
    pub fn set_filters(&mut self, filters: QueryPayload) {
        if filters == self.query.filters {
            return;
        }
        self.query.filters = filters;
        self.query.page = 1;
        self.invalidate();
    }

    /// Select a sort (default → sorted) or clear it (sorted → default)
    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        if sort == self.query.sort {
            return;
        }
        match (&self.query.sort, &sort) {
            (None, Some(next)) => tracing::debug!("list switching to sorted path ({next})"),
            (Some(_), None) => tracing::debug!("list switching to default path"),
            _ => {}
        }
        self.query.sort = sort;
        self.query.page = 1;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        // Dropping the pending token is what makes its response stale.
        self.pending = None;
        self.error = None;
        self.needs_fetch = true;
    }

    /// Issue a fetch for the live path only
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.next_token += 1;
        let token = FetchToken(self.next_token);
        let request = self.query.request();
        self.pending = Some(Pending {
            token,
            request: request.clone(),
        });
        self.needs_fetch = false;
        FetchTicket { token, request }
    }

    /// Manual retry after a failure: a fresh fetch for the same key
    pub fn retry(&mut self) -> FetchTicket {
        self.begin_fetch()
    }

    /// Apply a response. Only the latest issued token is accepted.
    pub fn resolve(&mut self, token: FetchToken, result: Result<ListPage>) -> FetchOutcome {
        let is_current = self.pending.as_ref().is_some_and(|p| p.token == token);
        if !is_current {
            tracing::debug!("dropping stale list response {:?}", token);
            return FetchOutcome::Stale;
        }
        let Some(pending) = self.pending.take() else {
            return FetchOutcome::Stale;
        };

        match result {
            Ok(page) => {
                self.loaded = Some(Loaded {
                    request: pending.request,
                    page,
                });
                self.error = None;
                FetchOutcome::Applied
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!("ticket list fetch failed: {message}");
                self.error = Some(message.clone());
                FetchOutcome::Failed(message)
            }
        }
    }

    /// Data for the current key only; a page loaded for other parameters is
    /// never shown in place of the one being loaded.
    pub fn current_page(&self) -> Option<&ListPage> {
        let current = self.query.request();
        self.loaded
            .as_ref()
            .filter(|l| l.request == current)
            .map(|l| &l.page)
    }

    pub fn view(&self) -> ListView<'_> {
        ListView {
            data: self.current_page(),
            is_fetching: self.is_fetching(),
            error: self.error(),
        }
    }

    /// Ticket numbers of the currently displayed page
    pub fn visible_ids(&self) -> Vec<TicketNumber> {
        self.current_page().map(ListPage::ids).unwrap_or_default()
    }

    pub fn page_count(&self) -> Option<u32> {
        self.current_page()
            .and_then(|p| p.page_count(self.query.page_size))
    }
}
