//! Controller State
//!
//! The single aggregate the reducer owns. Everything a surface may display is
//! derived from it (see [`crate::view`]); nothing outside the reducer mutates
//! it.

use serde::{Deserialize, Serialize};

use crate::events::ContextToken;
use crate::feedback::FeedbackRecord;
use crate::messages::{ConductorStatus, MessageOrdinal, SessionId};
use crate::pagination::{Pagination, PaginationConfig};
use crate::session::{SessionSummary, Transcript};

/// Greeting shown at the top of a detached conversation
pub const DEFAULT_GREETING: &str = "Hello! How can I help you today?";

/// Reply appended when a send fails
pub const SEND_FAILURE_REPLY: &str = "Sorry, an error occurred.";

/// Settings fixed at construction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSettings {
    /// Text of the synthetic greeting
    pub greeting: String,
    /// Page size and scroll trigger
    pub pagination: PaginationConfig,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            pagination: PaginationConfig::default(),
        }
    }
}

/// The operation a `Retry` intent re-issues
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryAction {
    /// Load the session list and greet again
    Bootstrap,
    /// Reload the first page of the active session
    ReloadSession(SessionId),
    /// Fetch the next older page
    LoadOlder,
    /// Send the same text again
    Resend(String),
    /// Delete the session again
    Delete(SessionId),
    /// Fetch the session list again
    RefreshSessions,
}

/// Authoritative controller state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConductorState {
    pub(crate) status: ConductorStatus,
    pub(crate) sessions: Vec<SessionSummary>,
    pub(crate) active_session_id: Option<SessionId>,
    pub(crate) transcript: Transcript,
    pub(crate) pending_input: String,
    pub(crate) error: Option<String>,
    pub(crate) pagination: Pagination,
    pub(crate) feedback: FeedbackRecord,
    /// Bumped on every context switch
    pub(crate) generation: u64,
    pub(crate) retry: Option<RetryAction>,
    /// A new-chat send is waiting for its session-list refresh
    pub(crate) awaiting_refresh: bool,
    /// Optimistic user message of the send in flight
    pub(crate) pending_send: Option<MessageOrdinal>,
    pub(crate) greeting: String,
}

impl ConductorState {
    /// Create the initial state (idle, empty, detached)
    #[must_use]
    pub fn new(settings: StateSettings) -> Self {
        Self {
            status: ConductorStatus::Idle,
            sessions: Vec::new(),
            active_session_id: None,
            transcript: Transcript::new(),
            pending_input: String::new(),
            error: None,
            pagination: Pagination::new(settings.pagination),
            feedback: FeedbackRecord::new(),
            generation: 0,
            retry: None,
            awaiting_refresh: false,
            pending_send: None,
            greeting: settings.greeting,
        }
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> ConductorStatus {
        self.status
    }

    /// Active session, if any
    #[must_use]
    pub fn active_session_id(&self) -> Option<&SessionId> {
        self.active_session_id.as_ref()
    }

    /// Token identifying the current context
    #[must_use]
    pub fn token(&self) -> ContextToken {
        ContextToken {
            generation: self.generation,
            session_id: self.active_session_id.clone(),
        }
    }

    /// Whether a completion issued under `token` still applies
    #[must_use]
    pub fn is_current(&self, token: &ContextToken) -> bool {
        token.generation == self.generation && token.session_id == self.active_session_id
    }

    /// Replace the whole transcript context in one step
    ///
    /// Messages, cursor, ratings and the send-refresh flag all belong to the
    /// outgoing context and are dropped together.
    pub(crate) fn switch_context(&mut self, session_id: Option<SessionId>, transcript: Transcript) {
        self.generation += 1;
        self.active_session_id = session_id;
        self.transcript = transcript;
        self.pagination.reset();
        self.feedback.clear();
        self.awaiting_refresh = false;
        self.pending_send = None;
    }

    /// A fresh greeting-only transcript
    pub(crate) fn greeting_transcript(&self) -> Transcript {
        Transcript::greeting(self.greeting.clone())
    }

    /// Record a failure without stealing status from an operation in flight
    ///
    /// Only a settled (`idle`) controller moves to `error`; a pending send or
    /// load keeps its status and settles it itself.
    pub(crate) fn record_failure(&mut self, error: String, retry: RetryAction) {
        self.error = Some(error);
        self.retry = Some(retry);
        if self.status == ConductorStatus::Idle {
            self.status = ConductorStatus::Error;
        }
    }

    /// Record a failure of the operation that owns the current status
    pub(crate) fn fail(&mut self, error: String, retry: RetryAction) {
        self.error = Some(error);
        self.retry = Some(retry);
        self.status = ConductorStatus::Error;
    }

    /// Settle into `idle`, clearing any error banner
    pub(crate) fn settle(&mut self) {
        self.status = ConductorStatus::Idle;
        self.error = None;
        self.retry = None;
    }
}

impl Default for ConductorState {
    fn default() -> Self {
        Self::new(StateSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{MessageOrdinal, MessageRole, Rating};

    #[test]
    fn test_initial_state() {
        let state = ConductorState::default();
        assert_eq!(state.status(), ConductorStatus::Idle);
        assert!(state.active_session_id().is_none());
        assert!(state.transcript.is_empty());
        assert_eq!(state.generation, 0);
    }

    #[test]
    fn test_switch_context_invalidates_tokens() {
        let mut state = ConductorState::default();
        let before = state.token();
        assert!(state.is_current(&before));

        state.transcript.push(MessageRole::Assistant, "old".to_string());
        state.feedback.record(MessageOrdinal(0), Rating::Good);
        state.pagination.page_loaded(1, Some(MessageOrdinal(9)));

        state.switch_context(Some(SessionId::new("s2")), Transcript::new());

        assert!(!state.is_current(&before));
        assert!(state.transcript.is_empty());
        assert!(state.feedback.is_empty());
        assert_eq!(state.pagination.cursor().pages_loaded, 0);
        assert!(state.is_current(&state.token()));
    }

    #[test]
    fn test_record_failure_keeps_loading() {
        let mut state = ConductorState::default();
        state.status = ConductorStatus::Loading;
        state.record_failure("boom".to_string(), RetryAction::LoadOlder);
        assert_eq!(state.status(), ConductorStatus::Loading);
        assert_eq!(state.error.as_deref(), Some("boom"));

        state.status = ConductorStatus::Idle;
        state.record_failure("boom".to_string(), RetryAction::LoadOlder);
        assert_eq!(state.status(), ConductorStatus::Error);
    }
}
