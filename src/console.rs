//! The ticket list console: owns every store and drives them against a
//! backend.
//!
//! Synchronous commands mutate state immediately. Network work comes in two
//! shapes: a convenience `async fn` that awaits the backend inline, and a
//! `begin_*` / `complete_*` pair for callers that interleave several requests
//! on one event loop.

use std::future::Future;
use std::time::Duration;

use crate::backend::{CommitEnvelope, TicketBackend, execute_list_request, settle_commit};
use crate::config::Config;
use crate::error::{Result, TicketDeskError};
use crate::filter::{FilterStateStore, FilterValue};
use crate::overlay::{OverlayCache, TicketPatch};
use crate::query::{FetchOutcome, FetchTicket, FetchToken, ListQuery, ListQuerySelector, SortSpec};
use crate::quick_edit::{CommitStart, PendingCommit, QuickEditDraft, QuickEditor};
use crate::schema::{FilterSchema, Operator, adapt_schema};
use crate::selection::SelectionSet;
use crate::types::{ListPage, TicketNumber, TicketRecord};

/// Run a backend call under the configured timeout
async fn with_timeout<T>(timeout: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| TicketDeskError::Timeout(timeout.as_secs()))?
}

pub struct TicketConsole {
    config: Config,
    schema_loaded: bool,
    filters: FilterStateStore,
    selector: ListQuerySelector,
    selection: SelectionSet,
    overlay: OverlayCache,
    quick_edit: QuickEditor,
}

impl TicketConsole {
    /// A console with no filter schema yet (only the pinned field, if any)
    pub fn new(config: Config) -> Self {
        let filters = FilterStateStore::new(FilterSchema::empty(), config.filter_policy());
        let selector = ListQuerySelector::new(ListQuery::new(config.list.page_size));
        Self {
            config,
            schema_loaded: false,
            filters,
            selector,
            selection: SelectionSet::new(),
            overlay: OverlayCache::new(),
            quick_edit: QuickEditor::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn filters(&self) -> &FilterStateStore {
        &self.filters
    }

    pub fn selector(&self) -> &ListQuerySelector {
        &self.selector
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn overlay(&self) -> &OverlayCache {
        &self.overlay
    }

    pub fn quick_editor(&self) -> &QuickEditor {
        &self.quick_edit
    }

    pub fn is_schema_loaded(&self) -> bool {
        self.schema_loaded
    }

    // ------------------------------------------------------------------
    // Schema
    // ------------------------------------------------------------------

    /// Install a raw schema. Only the first call takes effect; the schema is
    /// read-only for the rest of the session. Filters entered while the
    /// schema was loading are carried over.
    pub fn install_schema(&mut self, raw: &serde_json::Value) {
        if self.schema_loaded {
            return;
        }
        let schema = adapt_schema(raw);
        let previous = std::mem::replace(
            &mut self.filters,
            FilterStateStore::new(FilterSchema::empty(), self.config.filter_policy()),
        );
        self.filters = previous.with_schema(schema);
        self.schema_loaded = true;
        self.sync_filters();
    }

    /// Fetch and install the filter schema. Failures degrade to "no filters
    /// available" and are only logged.
    pub async fn load_schema<B: TicketBackend>(&mut self, backend: &B) {
        if self.schema_loaded {
            return;
        }
        match with_timeout(self.config.timeout(), backend.fetch_filter_schema()).await {
            Ok(raw) => self.install_schema(&raw),
            Err(e) => {
                let e = TicketDeskError::Schema(e.to_string());
                tracing::warn!("{e}; continuing without filters");
                self.install_schema(&serde_json::Value::Null);
            }
        }
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    fn sync_filters(&mut self) {
        self.selector.set_filters(self.filters.build_query_payload());
    }

    pub fn activate_filter(&mut self, field: &str) -> Result<()> {
        self.filters.activate(field)?;
        self.sync_filters();
        Ok(())
    }

    pub fn deactivate_filter(&mut self, field: &str) {
        self.filters.deactivate(field);
        self.sync_filters();
    }

    pub fn set_filter_value(&mut self, field: &str, value: FilterValue) {
        self.filters.set_value(field, value);
        self.sync_filters();
    }

    pub fn set_filter_operator(&mut self, field: &str, operator: Operator) {
        self.filters.set_operator(field, operator);
        self.sync_filters();
    }

    pub fn reset_filters(&mut self) {
        self.filters.reset_all();
        self.sync_filters();
    }

    // ------------------------------------------------------------------
    // Sort and pagination
    // ------------------------------------------------------------------

    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.selector.set_sort(sort);
    }

    /// Column-header click: new column ascending, same column flips
    pub fn sort_by_column(&mut self, field: &str) {
        let next = SortSpec::toggled(self.selector.sort(), field);
        self.selector.set_sort(Some(next));
    }

    pub fn clear_sort(&mut self) {
        self.selector.set_sort(None);
    }

    pub fn set_page(&mut self, page: u32) {
        self.selector.set_page(page);
    }

    pub fn next_page(&mut self) {
        let next = self.selector.page() + 1;
        if let Some(count) = self.selector.page_count()
            && next > count
        {
            return;
        }
        self.selector.set_page(next);
    }

    pub fn prev_page(&mut self) {
        let page = self.selector.page();
        if page > 1 {
            self.selector.set_page(page - 1);
        }
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.selector.set_page_size(page_size);
    }

    // ------------------------------------------------------------------
    // Fetching
    // ------------------------------------------------------------------

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.selector.begin_fetch()
    }

    /// Hand a list response back. Stale responses are dropped silently.
    pub fn complete_fetch(&mut self, token: FetchToken, result: Result<ListPage>) -> FetchOutcome {
        let outcome = self.selector.resolve(token, result);
        if outcome == FetchOutcome::Applied
            && let Some(page) = self.selector.current_page()
        {
            let cleared = self.overlay.clear_confirmed(&page.data);
            if cleared > 0 {
                tracing::debug!("{cleared} overlay entries confirmed by refetch");
            }
        }
        outcome
    }

    /// Fetch the current page on the live path. A failure is returned as
    /// [`TicketDeskError::Fetch`]; the previous page stays visible.
    pub async fn refresh<B: TicketBackend>(&mut self, backend: &B) -> Result<FetchOutcome> {
        let ticket = self.selector.begin_fetch();
        let result = with_timeout(
            self.config.timeout(),
            execute_list_request(backend, &ticket.request),
        )
        .await;
        match self.complete_fetch(ticket.token, result) {
            FetchOutcome::Failed(message) => Err(TicketDeskError::Fetch(message)),
            outcome => Ok(outcome),
        }
    }

    /// The current page as it should be displayed (overlays applied)
    pub fn effective_rows(&self) -> Vec<TicketRecord> {
        self.selector
            .current_page()
            .map(|page| page.data.iter().map(|r| self.overlay.effective(r)).collect())
            .unwrap_or_default()
    }

    fn visible_record(&self, id: &str) -> Result<TicketRecord> {
        self.selector
            .current_page()
            .and_then(|page| page.get(id))
            .map(|record| self.overlay.effective(record))
            .ok_or_else(|| TicketDeskError::TicketNotVisible(id.to_string()))
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn toggle_selection(&mut self, id: &TicketNumber) {
        self.selection.toggle(id);
    }

    /// Master checkbox: acts on the visible page only
    pub fn toggle_select_page(&mut self) {
        let visible = self.selector.visible_ids();
        self.selection.toggle_master(&visible);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ------------------------------------------------------------------
    // Quick edit
    // ------------------------------------------------------------------

    /// Open the quick-update popover for a ticket on the current page.
    /// Returns the ticket whose session was force-closed, if any.
    pub fn open_quick_edit(&mut self, id: &str) -> Result<Option<TicketNumber>> {
        let record = self.visible_record(id)?;
        Ok(self.quick_edit.open(&record))
    }

    pub fn update_quick_edit(&mut self, f: impl FnOnce(&mut QuickEditDraft)) -> Result<bool> {
        self.quick_edit.edit(f)
    }

    pub fn cancel_quick_edit(&mut self) {
        self.quick_edit.cancel();
    }

    pub fn begin_quick_commit(&mut self) -> Result<CommitStart> {
        self.quick_edit.begin_commit()
    }

    pub fn complete_quick_commit(
        &mut self,
        pending: PendingCommit,
        response: Result<CommitEnvelope>,
    ) -> Result<()> {
        let confirmed = settle_commit(response, &pending.patch);
        self.quick_edit
            .complete_commit(pending, confirmed, &mut self.overlay)
    }

    /// Commit the open quick edit. Returns `false` when nothing needed sending.
    pub async fn commit_quick_edit<B: TicketBackend>(&mut self, backend: &B) -> Result<bool> {
        let pending = match self.quick_edit.begin_commit()? {
            CommitStart::Send(pending) => pending,
            CommitStart::Unchanged | CommitStart::AlreadySubmitting => return Ok(false),
        };
        let response = with_timeout(
            self.config.timeout(),
            backend.update_ticket(&pending.ticket, &pending.patch),
        )
        .await;
        self.complete_quick_commit(pending, response)?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Row and bulk actions
    // ------------------------------------------------------------------

    /// Flip the "important" mark of a visible ticket. Returns the confirmed
    /// value.
    pub async fn toggle_important<B: TicketBackend>(
        &mut self,
        backend: &B,
        id: &str,
    ) -> Result<bool> {
        let record = self.visible_record(id)?;
        let patch = TicketPatch::important(!record.important);
        let response = with_timeout(
            self.config.timeout(),
            backend.update_ticket(&record.ticket_number, &patch),
        )
        .await;

        let confirmed = settle_commit(response, &patch).inspect_err(|e| {
            tracing::warn!("marking {} important failed: {e}", record.ticket_number);
        })?;
        let important = confirmed.important.unwrap_or(!record.important);
        self.overlay.commit(&record.ticket_number, confirmed);
        Ok(important)
    }

    /// Apply one patch to every selected ticket. On success the overlay is
    /// updated for each and the selection is cleared; on failure nothing
    /// changes. Returns how many tickets were updated.
    pub async fn bulk_update<B: TicketBackend>(
        &mut self,
        backend: &B,
        patch: TicketPatch,
    ) -> Result<usize> {
        if self.selection.is_empty() {
            return Err(TicketDeskError::EmptySelection);
        }
        let ids = self.selection.to_sorted_vec();
        let response =
            with_timeout(self.config.timeout(), backend.bulk_update(&ids, &patch)).await;

        let confirmed = settle_commit(response, &patch).inspect_err(|e| {
            tracing::warn!("bulk update of {} tickets failed: {e}", ids.len());
        })?;
        for id in &ids {
            self.overlay.commit(id, confirmed.clone());
        }
        self.selection.clear();
        Ok(ids.len())
    }
}
