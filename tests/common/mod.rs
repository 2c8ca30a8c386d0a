#![allow(dead_code)]

pub mod mock_data;

use std::collections::VecDeque;

use parking_lot::Mutex;
use ticketdesk::{
    CommitEnvelope, ListPage, QueryPayload, Result, SortSpec, TicketBackend, TicketDeskError,
    TicketNumber, TicketPatch,
};

/// A backend call as the fake saw it
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Schema,
    List {
        page: u32,
        limit: u32,
        filters: QueryPayload,
    },
    Sorted {
        sort: SortSpec,
        page: u32,
        limit: u32,
    },
    Update {
        id: TicketNumber,
        patch: TicketPatch,
    },
    Bulk {
        ids: Vec<TicketNumber>,
        patch: TicketPatch,
    },
}

/// In-memory backend with scripted replies. `Err(message)` entries surface
/// as [`TicketDeskError::Api`]. An empty queue answers with an error too.
#[derive(Default)]
pub struct FakeBackend {
    schema: Mutex<Option<std::result::Result<serde_json::Value, String>>>,
    pages: Mutex<VecDeque<std::result::Result<ListPage, String>>>,
    commits: Mutex<VecDeque<std::result::Result<CommitEnvelope, String>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(self, schema: serde_json::Value) -> Self {
        *self.schema.lock() = Some(Ok(schema));
        self
    }

    pub fn with_schema_error(self, message: &str) -> Self {
        *self.schema.lock() = Some(Err(message.to_string()));
        self
    }

    pub fn push_page(&self, page: ListPage) {
        self.pages.lock().push_back(Ok(page));
    }

    pub fn push_page_error(&self, message: &str) {
        self.pages.lock().push_back(Err(message.to_string()));
    }

    pub fn push_commit(&self, envelope: CommitEnvelope) {
        self.commits.lock().push_back(Ok(envelope));
    }

    pub fn push_commit_error(&self, message: &str) {
        self.commits.lock().push_back(Err(message.to_string()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn next_page(&self) -> Result<ListPage> {
        match self.pages.lock().pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(TicketDeskError::Api(message)),
            None => Err(TicketDeskError::Api("no scripted page".to_string())),
        }
    }

    fn next_commit(&self) -> Result<CommitEnvelope> {
        match self.commits.lock().pop_front() {
            Some(Ok(envelope)) => Ok(envelope),
            Some(Err(message)) => Err(TicketDeskError::Api(message)),
            None => Err(TicketDeskError::Api("no scripted commit".to_string())),
        }
    }
}

impl TicketBackend for FakeBackend {
    async fn fetch_filter_schema(&self) -> Result<serde_json::Value> {
        self.record(Call::Schema);
        match self.schema.lock().clone() {
            Some(Ok(schema)) => Ok(schema),
            Some(Err(message)) => Err(TicketDeskError::Api(message)),
            None => Ok(serde_json::Value::Null),
        }
    }

    async fn get_list(&self, page: u32, limit: u32, filters: &QueryPayload) -> Result<ListPage> {
        self.record(Call::List {
            page,
            limit,
            filters: filters.clone(),
        });
        self.next_page()
    }

    async fn get_sorted_list(&self, sort: &SortSpec, page: u32, limit: u32) -> Result<ListPage> {
        self.record(Call::Sorted {
            sort: sort.clone(),
            page,
            limit,
        });
        self.next_page()
    }

    async fn update_ticket(&self, id: &TicketNumber, patch: &TicketPatch) -> Result<CommitEnvelope> {
        self.record(Call::Update {
            id: id.clone(),
            patch: patch.clone(),
        });
        self.next_commit()
    }

    async fn bulk_update(&self, ids: &[TicketNumber], patch: &TicketPatch) -> Result<CommitEnvelope> {
        self.record(Call::Bulk {
            ids: ids.to_vec(),
            patch: patch.clone(),
        });
        self.next_commit()
    }
}
