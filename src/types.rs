//! Server-owned ticket data as it arrives from the list endpoints.
//!
//! These types are read-only from the engine's point of view. Local edits are
//! layered on top by [`crate::overlay::OverlayCache`] and never written back
//! into a `TicketRecord`.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Stable ticket identifier (e.g. `T-100`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TicketNumber(String);

impl TicketNumber {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TicketNumber {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TicketNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for TicketNumber {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for TicketNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        string_or_number(deserializer).map(TicketNumber)
    }
}

/// Accept either a JSON string or a JSON number and keep it as a string.
///
/// Backends are inconsistent about whether ids are numeric.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

/// A lookup value embedded in a ticket (status, priority, department)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NamedRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: None,
        }
    }
}

/// A person referenced by a ticket (assignee, requester)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
        }
    }
}

/// A ticket as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    pub ticket_number: TicketNumber,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub status: Option<NamedRef>,
    #[serde(default)]
    pub priority: Option<NamedRef>,
    #[serde(default)]
    pub department: Option<NamedRef>,
    #[serde(default)]
    pub assignee: Option<UserRef>,
    #[serde(default)]
    pub from_user: Option<UserRef>,
    #[serde(default)]
    pub important: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Fields this engine does not interpret, kept so nothing is lost
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TicketRecord {
    pub fn new(ticket_number: impl Into<TicketNumber>) -> Self {
        Self {
            ticket_number: ticket_number.into(),
            subject: String::new(),
            status: None,
            priority: None,
            department: None,
            assignee: None,
            from_user: None,
            important: false,
            created_at: None,
            extra: BTreeMap::new(),
        }
    }
}

/// Pagination metadata, when the backend provides it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
}

/// One page of tickets from either list endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListPage {
    #[serde(default)]
    pub data: Vec<TicketRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl ListPage {
    pub fn new(data: Vec<TicketRecord>) -> Self {
        Self {
            data,
            pagination: None,
        }
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.pagination = Some(Pagination { total });
        self
    }

    /// Ticket numbers on this page, in display order
    pub fn ids(&self) -> Vec<TicketNumber> {
        self.data.iter().map(|t| t.ticket_number.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&TicketRecord> {
        self.data.iter().find(|t| t.ticket_number.as_str() == id)
    }

    /// Number of pages for the given page size, if the total is known
    pub fn page_count(&self, page_size: u32) -> Option<u32> {
        let total = self.pagination?.total;
        let page_size = u64::from(page_size.max(1));
        Some(u32::try_from(total.div_ceil(page_size).max(1)).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accepts_numeric_ids() {
        let json = r#"{
            "ticketNumber": 100,
            "subject": "Printer on fire",
            "status": {"id": 3, "name": "open", "color": "green"},
            "assignee": {"id": "u-1", "name": "Sam"},
            "important": true,
            "channel": "email"
        }"#;
        let record: TicketRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.ticket_number.as_str(), "100");
        assert_eq!(record.status.as_ref().unwrap().id, "3");
        assert_eq!(record.assignee.as_ref().unwrap().name, "Sam");
        assert!(record.important);
        assert_eq!(record.extra.get("channel").unwrap(), "email");
        assert!(record.priority.is_none());
    }

    #[test]
    fn test_list_page_without_pagination() {
        let page: ListPage =
            serde_json::from_str(r#"{"data": [{"ticketNumber": "T-1"}]}"#).unwrap();
        assert_eq!(page.data.len(), 1);
        assert!(page.pagination.is_none());
        assert_eq!(page.page_count(10), None);
    }

    #[test]
    fn test_page_count_rounds_up() {
        let page = ListPage::new(vec![]).with_total(21);
        assert_eq!(page.page_count(10), Some(3));
        let empty = ListPage::new(vec![]).with_total(0);
        assert_eq!(empty.page_count(10), Some(1));
    }

    #[test]
    fn test_page_count_saturates() {
        let huge = ListPage::new(vec![]).with_total(u64::MAX);
        assert_eq!(huge.page_count(1), Some(u32::MAX));
        assert_eq!(ListPage::default().page_count(10), None);
    }
}
