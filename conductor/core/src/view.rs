//! Transcript View
//!
//! Read-only projections of [`ConductorState`] for surfaces. [`TranscriptView`]
//! borrows the live state for in-process rendering; [`ViewSnapshot`] is an
//! owned copy the conductor pushes over its channel.

use serde::{Deserialize, Serialize};

use crate::messages::{ConductorStatus, MessageOrdinal, MessageRole, Rating, SessionId};
use crate::session::{ChatMessage, SessionSummary};
use crate::state::ConductorState;

/// Borrowed, read-only view of the controller state
#[derive(Clone, Copy, Debug)]
pub struct TranscriptView<'a> {
    state: &'a ConductorState,
}

impl<'a> TranscriptView<'a> {
    /// Wrap a state
    #[must_use]
    pub fn new(state: &'a ConductorState) -> Self {
        Self { state }
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> ConductorStatus {
        self.state.status
    }

    /// Session list, most recent first
    #[must_use]
    pub fn sessions(&self) -> &'a [SessionSummary] {
        &self.state.sessions
    }

    /// Active session, if any
    #[must_use]
    pub fn active_session_id(&self) -> Option<&'a SessionId> {
        self.state.active_session_id.as_ref()
    }

    /// Loaded messages, oldest first
    #[must_use]
    pub fn messages(&self) -> &'a [ChatMessage] {
        self.state.transcript.as_slice()
    }

    /// Text in the input box
    #[must_use]
    pub fn pending_input(&self) -> &'a str {
        &self.state.pending_input
    }

    /// Whether older history remains on the server
    #[must_use]
    pub fn has_more_history(&self) -> bool {
        self.state.pagination.cursor().has_more
    }

    /// Whether an older page is being fetched
    #[must_use]
    pub fn is_loading_older(&self) -> bool {
        self.state.pagination.cursor().fetching
    }

    /// Last error, if not yet cleared
    #[must_use]
    pub fn error(&self) -> Option<&'a str> {
        self.state.error.as_deref()
    }

    /// The rating given to a message
    #[must_use]
    pub fn rating_for(&self, ordinal: MessageOrdinal) -> Option<Rating> {
        self.state.feedback.rating(ordinal)
    }

    /// Whether a send would be accepted right now
    #[must_use]
    pub fn can_send(&self) -> bool {
        !matches!(
            self.state.status,
            ConductorStatus::Loading | ConductorStatus::SessionLoading
        )
    }

    /// Whether a failed operation can be retried
    #[must_use]
    pub fn can_retry(&self) -> bool {
        self.state.retry.is_some()
    }

    /// Owned copy for sending to a surface
    #[must_use]
    pub fn snapshot(&self) -> ViewSnapshot {
        let messages = self
            .messages()
            .iter()
            .map(|m| MessageView {
                ordinal: m.ordinal,
                role: m.role,
                text: m.text.clone(),
                synthetic: m.synthetic,
                rating: self.rating_for(m.ordinal),
            })
            .collect();

        ViewSnapshot {
            status: self.status(),
            sessions: self.sessions().to_vec(),
            active_session_id: self.active_session_id().cloned(),
            messages,
            pending_input: self.pending_input().to_string(),
            has_more_history: self.has_more_history(),
            loading_older: self.is_loading_older(),
            error: self.error().map(str::to_string),
            can_send: self.can_send(),
            can_retry: self.can_retry(),
        }
    }
}

impl ConductorState {
    /// Read-only view of this state
    #[must_use]
    pub fn view(&self) -> TranscriptView<'_> {
        TranscriptView::new(self)
    }
}

/// A message as a surface renders it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    /// Stable position
    pub ordinal: MessageOrdinal,
    /// Who sent it
    pub role: MessageRole,
    /// Content
    pub text: String,
    /// Local-only message
    pub synthetic: bool,
    /// Rating, if given
    pub rating: Option<Rating>,
}

impl MessageView {
    /// Whether the user may still rate this message
    #[must_use]
    pub fn is_rateable(&self) -> bool {
        self.role == MessageRole::Assistant && !self.synthetic && self.rating.is_none()
    }
}

/// Owned snapshot of everything a surface may display
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    /// Current status
    pub status: ConductorStatus,
    /// Session list
    pub sessions: Vec<SessionSummary>,
    /// Active session
    pub active_session_id: Option<SessionId>,
    /// Loaded messages, oldest first
    pub messages: Vec<MessageView>,
    /// Input box text
    pub pending_input: String,
    /// Older history remains
    pub has_more_history: bool,
    /// An older page is being fetched
    pub loading_older: bool,
    /// Last error
    pub error: Option<String>,
    /// A send would be accepted
    pub can_send: bool,
    /// A retry is available
    pub can_retry: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, SurfaceEvent};
    use crate::reducer::reduce;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_view_of_initial_state() {
        let state = ConductorState::default();
        let view = state.view();
        assert_eq!(view.status(), ConductorStatus::Idle);
        assert!(view.messages().is_empty());
        assert!(!view.has_more_history());
        assert!(view.can_send());
        assert!(!view.can_retry());
    }

    #[test]
    fn test_snapshot_carries_ratings() {
        let mut state = ConductorState::default();
        reduce(&mut state, Event::Surface(SurfaceEvent::NewChat));
        let ordinal = state.transcript.push(MessageRole::Assistant, "hey".to_string());
        state.feedback.record(ordinal, Rating::Good);

        let snapshot = state.view().snapshot();
        assert_eq!(snapshot.messages.len(), 2);
        assert!(snapshot.messages[0].synthetic);
        assert!(!snapshot.messages[0].is_rateable());
        assert_eq!(snapshot.messages[1].rating, Some(Rating::Good));
        assert!(!snapshot.messages[1].is_rateable());
    }

    #[test]
    fn test_cannot_send_while_loading() {
        let mut state = ConductorState::default();
        reduce(
            &mut state,
            Event::Surface(SurfaceEvent::SendMessage {
                text: "hi".to_string(),
            }),
        );
        let view = state.view();
        assert_eq!(view.status(), ConductorStatus::Loading);
        assert!(!view.can_send());
        assert_eq!(view.snapshot().status, ConductorStatus::Loading);
    }

    #[test]
    fn test_can_send_during_bootstrap_but_not_switch() {
        let mut state = ConductorState::default();
        reduce(&mut state, Event::Surface(SurfaceEvent::Bootstrap));
        assert_eq!(state.view().status(), ConductorStatus::PageLoading);
        assert!(state.view().can_send());

        state.status = ConductorStatus::SessionLoading;
        assert!(!state.view().can_send());
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let snapshot = ConductorState::default().view().snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "idle");
        assert_eq!(json["hasMoreHistory"], false);
        assert!(json["activeSessionId"].is_null());
    }
}
