//! Ticket backend interface.
//!
//! The engine talks to the server through [`TicketBackend`]. The HTTP
//! implementation lives in [`http`]; tests provide in-memory fakes.

pub mod http;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TicketDeskError};
use crate::filter::QueryPayload;
use crate::overlay::TicketPatch;
use crate::query::{ListRequest, SortSpec};
use crate::types::{ListPage, TicketNumber};

pub use http::HttpBackend;

/// Reply of the patch and bulk endpoints.
///
/// Backends disagree on how they report failure: some reject the request,
/// others answer 200 with `success: false`. Both end up as
/// [`TicketDeskError::Commit`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitEnvelope {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Server-corrected values, when the backend sends them back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<TicketPatch>,
}

fn default_success() -> bool {
    true
}

impl CommitEnvelope {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn ok_with(data: TicketPatch) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// The confirmed patch: server-corrected values laid over what was sent
    pub fn into_confirmed(self, sent: &TicketPatch) -> Result<TicketPatch> {
        if !self.success {
            return Err(TicketDeskError::Commit(
                self.message
                    .unwrap_or_else(|| "the server rejected the change".to_string()),
            ));
        }
        let mut confirmed = sent.clone();
        if let Some(corrected) = self.data {
            confirmed.merge(corrected);
        }
        Ok(confirmed)
    }
}

/// Normalize a thrown rejection or a `success: false` payload into one
/// commit result.
pub fn settle_commit(
    response: Result<CommitEnvelope>,
    sent: &TicketPatch,
) -> Result<TicketPatch> {
    match response {
        Ok(envelope) => envelope.into_confirmed(sent),
        Err(TicketDeskError::Commit(message)) => Err(TicketDeskError::Commit(message)),
        Err(other) => Err(TicketDeskError::Commit(other.to_string())),
    }
}

/// Common interface for ticket backends
pub trait TicketBackend: Send + Sync {
    /// Raw filter field descriptors (runtime-typed)
    fn fetch_filter_schema(
        &self,
    ) -> impl std::future::Future<Output = Result<serde_json::Value>> + Send;

    /// Default-ordered, filtered listing
    fn get_list(
        &self,
        page: u32,
        limit: u32,
        filters: &QueryPayload,
    ) -> impl std::future::Future<Output = Result<ListPage>> + Send;

    /// Explicitly sorted listing
    fn get_sorted_list(
        &self,
        sort: &SortSpec,
        page: u32,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<ListPage>> + Send;

    /// Apply a partial change to one ticket
    fn update_ticket(
        &self,
        id: &TicketNumber,
        patch: &TicketPatch,
    ) -> impl std::future::Future<Output = Result<CommitEnvelope>> + Send;

    /// Apply the same partial change to several tickets
    fn bulk_update(
        &self,
        ids: &[TicketNumber],
        patch: &TicketPatch,
    ) -> impl std::future::Future<Output = Result<CommitEnvelope>> + Send;
}

/// Send a list request down whichever path it names
pub async fn execute_list_request<B: TicketBackend>(
    backend: &B,
    request: &ListRequest,
) -> Result<ListPage> {
    match request {
        ListRequest::Default {
            page,
            page_size,
            filters,
        } => backend.get_list(*page, *page_size, filters).await,
        ListRequest::Sorted {
            sort,
            page,
            page_size,
        } => backend.get_sorted_list(sort, *page, *page_size).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NamedRef;

    fn sent() -> TicketPatch {
        TicketPatch {
            status: Some(NamedRef::new("9", "closed")),
            priority: Some(NamedRef::new("2", "normal")),
            ..Default::default()
        }
    }

    #[test]
    fn test_envelope_success_without_data_confirms_sent() {
        assert_eq!(CommitEnvelope::ok().into_confirmed(&sent()).unwrap(), sent());
    }

    #[test]
    fn test_envelope_server_corrections_win() {
        let corrected = TicketPatch {
            priority: Some(NamedRef::new("3", "high")),
            ..Default::default()
        };
        let confirmed = CommitEnvelope::ok_with(corrected)
            .into_confirmed(&sent())
            .unwrap();
        assert_eq!(confirmed.priority.unwrap().name, "high");
        assert_eq!(confirmed.status.unwrap().name, "closed");
    }

    #[test]
    fn test_envelope_failure_payload() {
        let err = CommitEnvelope::failed("ticket is locked")
            .into_confirmed(&sent())
            .unwrap_err();
        assert!(matches!(err, TicketDeskError::Commit(ref m) if m == "ticket is locked"));
    }

    #[test]
    fn test_envelope_json_defaults_to_success() {
        let envelope: CommitEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.success);
        let envelope: CommitEnvelope =
            serde_json::from_str(r#"{"success": false, "message": "nope"}"#).unwrap();
        assert!(!envelope.success);
    }

    #[test]
    fn test_settle_commit_normalizes_rejections() {
        let err = settle_commit(Err(TicketDeskError::Api("HTTP 500".into())), &sent())
            .unwrap_err();
        assert!(matches!(err, TicketDeskError::Commit(ref m) if m.contains("HTTP 500")));

        let err = settle_commit(Ok(CommitEnvelope::failed("denied")), &sent()).unwrap_err();
        assert!(matches!(err, TicketDeskError::Commit(ref m) if m == "denied"));
    }
}
