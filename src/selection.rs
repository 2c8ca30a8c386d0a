//! Multi-select state for bulk operations
//!
//! Selection is keyed by ticket number and is deliberately independent of
//! the current page, sort and filters: paging away and back keeps checks.

use std::collections::HashSet;

use crate::types::TicketNumber;

/// Tri-state of the "select page" checkbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterState {
    Unchecked,
    Indeterminate,
    Checked,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<TicketNumber>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: &TicketNumber) {
        if !self.ids.remove(id) {
            self.ids.insert(id.clone());
        }
    }

    pub fn select_all<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a TicketNumber>,
    {
        self.ids.extend(ids.into_iter().cloned());
    }

    pub fn deselect_all<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a TicketNumber>,
    {
        for id in ids {
            self.ids.remove(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TicketNumber> {
        self.ids.iter()
    }

    /// Selected ids in a stable order, for bulk requests
    pub fn to_sorted_vec(&self) -> Vec<TicketNumber> {
        let mut ids: Vec<TicketNumber> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Master checkbox state for the visible page
    pub fn master_state(&self, visible: &[TicketNumber]) -> MasterState {
        let selected = visible.iter().filter(|id| self.ids.contains(*id)).count();
        if visible.is_empty() || selected == 0 {
            MasterState::Unchecked
        } else if selected == visible.len() {
            MasterState::Checked
        } else {
            MasterState::Indeterminate
        }
    }

    /// Click on the master checkbox: touches only the visible ids
    pub fn toggle_master(&mut self, visible: &[TicketNumber]) {
        if self.master_state(visible) == MasterState::Checked {
            self.deselect_all(visible);
        } else {
            self.select_all(visible);
        }
    }
}
