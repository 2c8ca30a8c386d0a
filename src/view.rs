//! Render-ready snapshot of the console
//!
//! Separates state ([`TicketConsole`]) from what a frontend draws, so the
//! whole screen can be asserted on without a UI framework.

use crate::console::TicketConsole;
use crate::filter::ActiveFilter;
use crate::query::SortSpec;
use crate::quick_edit::QuickEditState;
use crate::selection::MasterState;
use crate::types::{TicketNumber, TicketRecord};

/// One table row: the effective record plus its checkbox
#[derive(Debug, Clone, PartialEq)]
pub struct TicketRow {
    pub record: TicketRecord,
    pub selected: bool,
}

/// Quick-update popover, when one is open
#[derive(Debug, Clone, PartialEq)]
pub struct QuickEditView {
    pub ticket: TicketNumber,
    pub state: QuickEditState,
    pub error: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TicketListView {
    /// Rows of the current page with overlays applied; empty while loading
    pub rows: Vec<TicketRow>,
    /// Whether the current key has data at all (as opposed to an empty page)
    pub has_data: bool,
    pub master: MasterState,
    pub is_fetching: bool,
    pub needs_fetch: bool,
    pub error: Option<String>,
    pub page: u32,
    pub page_count: Option<u32>,
    pub sort: Option<SortSpec>,
    pub active_filters: Vec<ActiveFilter>,
    /// Whether another filter can be added without hitting the cap
    pub can_add_filter: bool,
    pub selected_count: usize,
    pub quick_edit: Option<QuickEditView>,
}

pub fn compute_list_view(console: &TicketConsole) -> TicketListView {
    let selector = console.selector();
    let selection = console.selection();
    let filters = console.filters();

    let rows: Vec<TicketRow> = console
        .effective_rows()
        .into_iter()
        .map(|record| TicketRow {
            selected: selection.is_selected(record.ticket_number.as_str()),
            record,
        })
        .collect();

    let quick_edit = console.quick_editor().session().map(|s| QuickEditView {
        ticket: s.ticket().clone(),
        state: s.state(),
        error: s.error().map(str::to_string),
        dirty: s.is_dirty(),
    });

    TicketListView {
        has_data: selector.current_page().is_some(),
        master: selection.master_state(&selector.visible_ids()),
        is_fetching: selector.is_fetching(),
        needs_fetch: selector.needs_fetch(),
        error: selector.error().map(str::to_string),
        page: selector.page(),
        page_count: selector.page_count(),
        sort: selector.sort().cloned(),
        active_filters: filters.active().to_vec(),
        can_add_filter: filters.capped_count() < filters.policy().max_active,
        selected_count: selection.len(),
        quick_edit,
        rows,
    }
}
