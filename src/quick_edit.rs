//! Inline quick edit of a single ticket
//!
//! One popover at a time: opening a new session force-closes the previous
//! one. A session goes `Closed → Open → Submitting → Closed` on success and
//! back to `Open` (keeping the agent's values) on failure. Commits are
//! fire-and-confirm: a confirmed commit is written to the overlay even if the
//! agent has moved on to another ticket in the meantime.

use crate::error::{Result, TicketDeskError};
use crate::overlay::{OverlayCache, TicketPatch};
use crate::types::{NamedRef, TicketNumber, TicketRecord, UserRef};

/// Identifies one opened session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickEditState {
    Closed,
    Open,
    Submitting,
}

/// Editable fields of the quick-update popover
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuickEditDraft {
    pub status: Option<NamedRef>,
    pub priority: Option<NamedRef>,
    pub department: Option<NamedRef>,
    pub assignee: Option<UserRef>,
}

impl QuickEditDraft {
    pub fn from_record(record: &TicketRecord) -> Self {
        Self {
            status: record.status.clone(),
            priority: record.priority.clone(),
            department: record.department.clone(),
            assignee: record.assignee.clone(),
        }
    }

    /// First lookup field set in `original` but emptied here. Only the
    /// assignee can be removed through a patch.
    fn cleared_field(&self, original: &QuickEditDraft) -> Option<&'static str> {
        [
            ("status", self.status.is_none() && original.status.is_some()),
            ("priority", self.priority.is_none() && original.priority.is_some()),
            (
                "department",
                self.department.is_none() && original.department.is_some(),
            ),
        ]
        .into_iter()
        .find_map(|(name, cleared)| cleared.then_some(name))
    }

    /// Patch containing only the fields that differ from `original`
    pub fn diff(&self, original: &QuickEditDraft) -> TicketPatch {
        fn changed<T: PartialEq + Clone>(now: &Option<T>, before: &Option<T>) -> Option<T> {
            if now != before { now.clone() } else { None }
        }

        TicketPatch {
            status: changed(&self.status, &original.status),
            priority: changed(&self.priority, &original.priority),
            department: changed(&self.department, &original.department),
            assignee: (self.assignee != original.assignee).then(|| self.assignee.clone()),
            important: None,
        }
    }
}

/// A commit that has been handed to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommit {
    pub session: SessionId,
    pub ticket: TicketNumber,
    pub patch: TicketPatch,
}

/// Result of asking a session to commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStart {
    /// Nothing changed; the session was closed without a request
    Unchanged,
    /// A commit for this session is already in flight
    AlreadySubmitting,
    Send(PendingCommit),
}

#[derive(Debug, Clone)]
pub struct QuickEditSession {
    id: SessionId,
    ticket: TicketNumber,
    original: QuickEditDraft,
    draft: QuickEditDraft,
    submitting: bool,
    error: Option<String>,
}

impl QuickEditSession {
    fn open(id: SessionId, record: &TicketRecord) -> Self {
        let draft = QuickEditDraft::from_record(record);
        Self {
            id,
            ticket: record.ticket_number.clone(),
            original: draft.clone(),
            draft,
            submitting: false,
            error: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn ticket(&self) -> &TicketNumber {
        &self.ticket
    }

    pub fn draft(&self) -> &QuickEditDraft {
        &self.draft
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> QuickEditState {
        if self.submitting {
            QuickEditState::Submitting
        } else {
            QuickEditState::Open
        }
    }

    pub fn is_dirty(&self) -> bool {
        !self.draft.diff(&self.original).is_empty()
    }
}

/// Owner of the (at most one) open quick edit session
#[derive(Debug, Clone, Default)]
pub struct QuickEditor {
    next_id: u64,
    session: Option<QuickEditSession>,
}

impl QuickEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&QuickEditSession> {
        self.session.as_ref()
    }

    pub fn state(&self) -> QuickEditState {
        self.session
            .as_ref()
            .map_or(QuickEditState::Closed, QuickEditSession::state)
    }

    /// Open a session seeded from the *effective* record. Any open session is
    /// force-closed first; its ticket number is returned.
    pub fn open(&mut self, effective: &TicketRecord) -> Option<TicketNumber> {
        let previous = self.session.take().map(|s| {
            tracing::debug!("force-closing quick edit for {}", s.ticket);
            s.ticket
        });
        self.next_id += 1;
        self.session = Some(QuickEditSession::open(SessionId(self.next_id), effective));
        previous
    }

    pub fn cancel(&mut self) {
        self.session = None;
    }

    /// Change draft values. Ignored while a commit is in flight. An edit
    /// that empties status, priority or department is refused and leaves
    /// the draft as it was.
    pub fn edit(&mut self, f: impl FnOnce(&mut QuickEditDraft)) -> Result<bool> {
        let session = self.session.as_mut().ok_or(TicketDeskError::NoQuickEdit)?;
        if session.submitting {
            return Ok(false);
        }
        let mut draft = session.draft.clone();
        f(&mut draft);
        if let Some(field) = draft.cleared_field(&session.original) {
            return Err(TicketDeskError::FieldNotClearable(field));
        }
        session.draft = draft;
        Ok(true)
    }

    pub fn begin_commit(&mut self) -> Result<CommitStart> {
        let session = self.session.as_mut().ok_or(TicketDeskError::NoQuickEdit)?;
        if session.submitting {
            return Ok(CommitStart::AlreadySubmitting);
        }

        let patch = session.draft.diff(&session.original);
        if patch.is_empty() {
            self.session = None;
            return Ok(CommitStart::Unchanged);
        }

        session.submitting = true;
        session.error = None;
        Ok(CommitStart::Send(PendingCommit {
            session: session.id,
            ticket: session.ticket.clone(),
            patch,
        }))
    }

    /// Settle a commit with the backend's answer.
    ///
    /// On success the confirmed patch goes into the overlay and the session
    /// (if it is still the one that sent it) closes. On failure nothing is
    /// written and the session returns to `Open` with the error attached.
    pub fn complete_commit(
        &mut self,
        pending: PendingCommit,
        result: Result<TicketPatch>,
        overlay: &mut OverlayCache,
    ) -> Result<()> {
        let is_current = self
            .session
            .as_ref()
            .is_some_and(|s| s.id == pending.session);

        match result {
            Ok(confirmed) => {
                overlay.commit(&pending.ticket, confirmed);
                if is_current {
                    self.session = None;
                }
                Ok(())
            }
            Err(e) => {
                let message = match e {
                    TicketDeskError::Commit(message) => message,
                    other => other.to_string(),
                };
                tracing::warn!("quick edit of {} failed: {message}", pending.ticket);
                if is_current && let Some(session) = self.session.as_mut() {
                    session.submitting = false;
                    session.error = Some(message.clone());
                }
                Err(TicketDeskError::Commit(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> TicketRecord {
        let mut r = TicketRecord::new(id);
        r.status = Some(NamedRef::new("1", "open"));
        r.priority = Some(NamedRef::new("2", "normal"));
        r
    }

    fn closed() -> NamedRef {
        NamedRef::new("9", "closed")
    }

    fn start(editor: &mut QuickEditor) -> PendingCommit {
        match editor.begin_commit().unwrap() {
            CommitStart::Send(pending) => pending,
            other => panic!("expected a commit to send, got {other:?}"),
        }
    }

    #[test]
    fn test_open_seeds_draft_from_record() {
        let mut editor = QuickEditor::new();
        assert_eq!(editor.state(), QuickEditState::Closed);
        editor.open(&record("T-1"));
        let session = editor.session().unwrap();
        assert_eq!(session.draft().status, Some(NamedRef::new("1", "open")));
        assert_eq!(editor.state(), QuickEditState::Open);
    }

    #[test]
    fn test_success_writes_overlay_and_closes() {
        let mut editor = QuickEditor::new();
        let mut overlay = OverlayCache::new();
        editor.open(&record("T-1"));
        editor.edit(|d| d.status = Some(closed())).unwrap();

        let pending = start(&mut editor);
        assert_eq!(editor.state(), QuickEditState::Submitting);
        assert_eq!(pending.patch.status, Some(closed()));
        assert!(pending.patch.priority.is_none());

        let confirmed = pending.patch.clone();
        editor
            .complete_commit(pending, Ok(confirmed), &mut overlay)
            .unwrap();
        assert_eq!(editor.state(), QuickEditState::Closed);
        assert_eq!(overlay.get("T-1").unwrap().status, Some(closed()));
    }

    #[test]
    fn test_failure_keeps_values_and_writes_nothing() {
        let mut editor = QuickEditor::new();
        let mut overlay = OverlayCache::new();
        editor.open(&record("T-1"));
        editor.edit(|d| d.status = Some(closed())).unwrap();

        let pending = start(&mut editor);
        let err = editor
            .complete_commit(
                pending,
                Err(TicketDeskError::Commit("locked".into())),
                &mut overlay,
            )
            .unwrap_err();
        assert!(matches!(err, TicketDeskError::Commit(ref m) if m == "locked"));

        assert!(overlay.is_empty());
        let session = editor.session().unwrap();
        assert_eq!(session.state(), QuickEditState::Open);
        assert_eq!(session.error(), Some("locked"));
        assert_eq!(session.draft().status, Some(closed()));

        // Retry without re-entering values
        let pending = start(&mut editor);
        assert_eq!(pending.patch.status, Some(closed()));
    }

    #[test]
    fn test_unchanged_commit_closes_without_request() {
        let mut editor = QuickEditor::new();
        editor.open(&record("T-1"));
        assert_eq!(editor.begin_commit().unwrap(), CommitStart::Unchanged);
        assert_eq!(editor.state(), QuickEditState::Closed);
    }

    #[test]
    fn test_double_submit_is_refused() {
        let mut editor = QuickEditor::new();
        editor.open(&record("T-1"));
        editor.edit(|d| d.status = Some(closed())).unwrap();
        start(&mut editor);
        assert_eq!(
            editor.begin_commit().unwrap(),
            CommitStart::AlreadySubmitting
        );
        assert!(!editor.edit(|d| d.status = None).unwrap());
    }

    #[test]
    fn test_opening_another_force_closes_previous() {
        let mut editor = QuickEditor::new();
        editor.open(&record("T-1"));
        let previous = editor.open(&record("T-2"));
        assert_eq!(previous, Some(TicketNumber::new("T-1")));
        assert_eq!(editor.session().unwrap().ticket().as_str(), "T-2");
    }

    #[test]
    fn test_confirmed_commit_of_closed_session_still_lands() {
        let mut editor = QuickEditor::new();
        let mut overlay = OverlayCache::new();
        editor.open(&record("T-1"));
        editor.edit(|d| d.status = Some(closed())).unwrap();
        let pending = start(&mut editor);

        editor.open(&record("T-2"));
        let confirmed = pending.patch.clone();
        editor
            .complete_commit(pending, Ok(confirmed), &mut overlay)
            .unwrap();

        assert!(overlay.get("T-1").is_some());
        // The newer session is untouched
        assert_eq!(editor.session().unwrap().ticket().as_str(), "T-2");
        assert_eq!(editor.state(), QuickEditState::Open);
    }

    #[test]
    fn test_edit_without_session() {
        let mut editor = QuickEditor::new();
        assert!(matches!(
            editor.edit(|_| {}),
            Err(TicketDeskError::NoQuickEdit)
        ));
        assert!(matches!(
            editor.begin_commit(),
            Err(TicketDeskError::NoQuickEdit)
        ));
    }

    #[test]
    fn test_clearing_lookup_field_is_refused() {
        let mut editor = QuickEditor::new();
        editor.open(&record("T-1"));
        editor.edit(|d| d.status = Some(closed())).unwrap();

        let err = editor
            .edit(|d| {
                d.priority = None;
                d.status = Some(NamedRef::new("1", "open"));
            })
            .unwrap_err();
        assert!(matches!(err, TicketDeskError::FieldNotClearable("priority")));

        // The refused edit left the draft untouched
        let draft = editor.session().unwrap().draft();
        assert_eq!(draft.status, Some(closed()));
        assert_eq!(draft.priority, Some(NamedRef::new("2", "normal")));
        let pending = start(&mut editor);
        assert_eq!(pending.patch.status, Some(closed()));
        assert_eq!(pending.patch.priority, None);
    }

    #[test]
    fn test_unset_field_may_stay_unset() {
        let mut editor = QuickEditor::new();
        editor.open(&record("T-1"));
        assert!(editor.edit(|d| d.department = None).unwrap());
    }

    #[test]
    fn test_unassign_diff() {
        let mut r = record("T-1");
        r.assignee = Some(UserRef::new("u-1", "Sam"));
        let original = QuickEditDraft::from_record(&r);
        let mut draft = original.clone();
        draft.assignee = None;
        assert_eq!(draft.diff(&original).assignee, Some(None));
    }
}
