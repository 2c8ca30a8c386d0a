//! Builders for test tickets, pages and schemas.

use serde_json::json;
use ticketdesk::{Config, ListPage, NamedRef, TicketRecord, UserRef};

/// Builder for creating test tickets
pub struct TicketBuilder {
    record: TicketRecord,
}

impl TicketBuilder {
    pub fn new(id: &str) -> Self {
        let mut record = TicketRecord::new(id);
        record.subject = format!("Ticket {id}");
        record.status = Some(NamedRef::new("1", "open"));
        record.priority = Some(NamedRef::new("2", "normal"));
        Self { record }
    }

    pub fn status(mut self, id: &str, name: &str) -> Self {
        self.record.status = Some(NamedRef::new(id, name));
        self
    }

    pub fn priority(mut self, id: &str, name: &str) -> Self {
        self.record.priority = Some(NamedRef::new(id, name));
        self
    }

    pub fn assignee(mut self, id: &str, name: &str) -> Self {
        self.record.assignee = Some(UserRef::new(id, name));
        self
    }

    pub fn important(mut self, important: bool) -> Self {
        self.record.important = important;
        self
    }

    pub fn build(self) -> TicketRecord {
        self.record
    }
}

/// A page of default tickets numbered `T-{first}..`
pub fn page_of(first: u32, count: u32, total: u64) -> ListPage {
    let data = (first..first + count)
        .map(|n| TicketBuilder::new(&format!("T-{n}")).build())
        .collect();
    ListPage::new(data).with_total(total)
}

/// Schema with a dropdown, a numeric (unrecognized, degrades to text) field
/// and enough others to exceed the default cap
pub fn support_schema() -> serde_json::Value {
    json!([
        {"name": "priority", "label": "Priority", "type": "dropdown",
         "choices": [{"value": "1", "label": "Low"}, {"value": "3", "label": "High"}]},
        {"name": "agentCount", "label": "Agents", "type": "number"},
        {"name": "status", "label": "Status", "type": "multiselect",
         "choices": ["open", "pending", "closed"]},
        {"name": "subject", "label": "Subject", "type": "text"},
        {"name": "createdAt", "label": "Created", "type": "date"},
        {"name": "department", "label": "Department", "type": "dropdown"}
    ])
}

/// Default config with `ticket_id` pinned
pub fn pinned_config() -> Config {
    let mut config = Config::default();
    config.filters.pinned_field = Some("ticket_id".to_string());
    config
}
