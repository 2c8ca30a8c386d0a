//! Local overlay of confirmed-but-not-yet-refetched edits
//!
//! Server pages are kept exactly as returned. Edits the backend has confirmed
//! are stored here per ticket number and merged over records at render time,
//! so a refetch can replace the base data at any moment without losing them.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{NamedRef, TicketNumber, TicketRecord, UserRef};

/// Partial ticket change. `None` means "not part of this patch".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<NamedRef>,
    /// `Some(None)` unassigns the ticket
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub assignee: Option<Option<UserRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub important: Option<bool>,
}

/// Distinguish an explicit `null` (unassign) from an absent key
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TicketPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.department.is_none()
            && self.assignee.is_none()
            && self.important.is_none()
    }

    pub fn important(value: bool) -> Self {
        Self {
            important: Some(value),
            ..Default::default()
        }
    }

    /// Fold `newer` into this patch; its present fields win
    pub fn merge(&mut self, newer: TicketPatch) {
        if newer.status.is_some() {
            self.status = newer.status;
        }
        if newer.priority.is_some() {
            self.priority = newer.priority;
        }
        if newer.department.is_some() {
            self.department = newer.department;
        }
        if newer.assignee.is_some() {
            self.assignee = newer.assignee;
        }
        if newer.important.is_some() {
            self.important = newer.important;
        }
    }

    /// Shallow field-level merge over a record
    pub fn apply_to(&self, record: &mut TicketRecord) {
        if let Some(status) = &self.status {
            record.status = Some(status.clone());
        }
        if let Some(priority) = &self.priority {
            record.priority = Some(priority.clone());
        }
        if let Some(department) = &self.department {
            record.department = Some(department.clone());
        }
        if let Some(assignee) = &self.assignee {
            record.assignee = assignee.clone();
        }
        if let Some(important) = self.important {
            record.important = important;
        }
    }

    /// Whether the record already carries every value in this patch
    pub fn is_reflected_in(&self, record: &TicketRecord) -> bool {
        let same_ref = |patched: &Option<NamedRef>, actual: &Option<NamedRef>| match patched {
            Some(p) => actual.as_ref().is_some_and(|a| a.id == p.id),
            None => true,
        };
        let assignee_matches = match &self.assignee {
            Some(Some(p)) => record.assignee.as_ref().is_some_and(|a| a.id == p.id),
            Some(None) => record.assignee.is_none(),
            None => true,
        };
        same_ref(&self.status, &record.status)
            && same_ref(&self.priority, &record.priority)
            && same_ref(&self.department, &record.department)
            && assignee_matches
            && self.important.is_none_or(|v| v == record.important)
    }
}

/// Record-keyed store of overlay patches
#[derive(Debug, Clone, Default)]
pub struct OverlayCache {
    patches: HashMap<TicketNumber, TicketPatch>,
}

impl OverlayCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed edit. New fields win; earlier untouched fields stay.
    pub fn commit(&mut self, id: &TicketNumber, patch: TicketPatch) {
        if patch.is_empty() {
            return;
        }
        self.patches.entry(id.clone()).or_default().merge(patch);
    }

    pub fn clear(&mut self, id: &str) {
        self.patches.remove(id);
    }

    pub fn get(&self, id: &str) -> Option<&TicketPatch> {
        self.patches.get(id)
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// The record as it should be displayed. Pure; the input is not touched.
    pub fn effective(&self, record: &TicketRecord) -> TicketRecord {
        let mut merged = record.clone();
        if let Some(patch) = self.patches.get(&record.ticket_number) {
            patch.apply_to(&mut merged);
        }
        merged
    }

    /// Drop overlays that freshly fetched records already reflect.
    ///
    /// Optional: leaving them in place is never incorrect.
    pub fn clear_confirmed(&mut self, records: &[TicketRecord]) -> usize {
        let mut cleared = 0;
        for record in records {
            let reflected = self
                .patches
                .get(&record.ticket_number)
                .is_some_and(|p| p.is_reflected_in(record));
            if reflected {
                self.patches.remove(&record.ticket_number);
                cleared += 1;
            }
        }
        cleared
    }
}
