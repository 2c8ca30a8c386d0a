#[macro_use]
mod macros;

pub mod backend;
pub mod config;
pub mod console;
pub mod error;
pub mod filter;
pub mod overlay;
pub mod query;
pub mod quick_edit;
pub mod schema;
pub mod selection;
pub mod types;
pub mod view;

pub use backend::{CommitEnvelope, HttpBackend, TicketBackend, execute_list_request, settle_commit};
pub use config::Config;
pub use console::TicketConsole;
pub use error::{Result, TicketDeskError};
pub use filter::{
    ActiveFilter, FilterClause, FilterPolicy, FilterStateStore, FilterValue, QueryPayload,
};
pub use overlay::{OverlayCache, TicketPatch};
pub use query::{
    FetchOutcome, FetchTicket, FetchToken, ListQuery, ListQuerySelector, ListRequest, SortOrder,
    SortSpec,
};
pub use quick_edit::{CommitStart, PendingCommit, QuickEditDraft, QuickEditState, QuickEditor};
pub use schema::{FilterField, FilterKind, FilterSchema, Operator, adapt_schema};
pub use selection::{MasterState, SelectionSet};
pub use types::{ListPage, NamedRef, TicketNumber, TicketRecord, UserRef};
pub use view::{TicketListView, TicketRow, compute_list_view};
