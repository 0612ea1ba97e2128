//! Events
//!
//! Everything that can change controller state arrives as an [`Event`]:
//! either a [`SurfaceEvent`] (a user intent from a UI surface) or a
//! [`Completion`] (the result of a backend call the conductor started).
//!
//! # Design Philosophy
//!
//! UI surfaces are "dumb" renderers that forward user actions to the Conductor.
//! They don't interpret what actions mean - they just report what happened.
//! Completions carry the [`ContextToken`] captured when their request was
//! dispatched, so the reducer can tell a current result from a stale one.

use serde::{Deserialize, Serialize};

use crate::backend::ApiMessage;
use crate::messages::{MessageOrdinal, Rating, SessionId};
use crate::session::SessionSummary;

/// Events from UI Surface to Conductor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// Surface started; load the session list and greet
    Bootstrap,

    /// User opened a session from navigation
    SelectSession {
        /// Session to open
        session_id: SessionId,
    },

    /// User started a fresh, detached conversation
    NewChat,

    /// User submitted a message
    SendMessage {
        /// The message content
        text: String,
    },

    /// User asked to delete a session
    DeleteSession {
        /// Session to delete
        session_id: SessionId,
    },

    /// User edited the input box
    InputChanged {
        /// Current input text
        text: String,
    },

    /// User scrolled the transcript
    Scrolled {
        /// Distance from the top of the transcript (surface units)
        offset_from_top: u32,
    },

    /// User explicitly asked for older history
    LoadOlder,

    /// User rated an assistant reply
    Rate {
        /// Which message
        ordinal: MessageOrdinal,
        /// The verdict
        rating: Rating,
    },

    /// User asked to retry the last failed operation
    Retry,

    /// User asked to refresh the session list
    RefreshSessions,
}

/// Identity of the transcript context a request was issued for
///
/// The generation changes on every context switch, so a token also tells
/// apart two visits to the same session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextToken {
    /// Context counter at dispatch time
    pub generation: u64,
    /// Active session at dispatch time
    pub session_id: Option<SessionId>,
}

/// Why the session list was fetched
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListReason {
    /// Initial load; settles `pageLoading`
    Bootstrap(ContextToken),
    /// Step (c) of a new-chat send; settles `loading`
    AfterStart(ContextToken),
    /// Plain refresh (after delete, or on request)
    Refresh,
}

/// Results of backend calls, fed back into the reducer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Completion {
    /// Session list arrived
    SessionsLoaded {
        /// Why it was requested
        reason: ListReason,
        /// The list, most recent first
        sessions: Vec<SessionSummary>,
    },
    /// Session list fetch failed
    SessionsFailed {
        /// Why it was requested
        reason: ListReason,
        /// Human-readable failure
        error: String,
    },

    /// A transcript page arrived
    PageLoaded {
        /// Context the page was requested for
        token: ContextToken,
        /// 1-based page number
        page: u32,
        /// Messages on the page, oldest first
        messages: Vec<ApiMessage>,
        /// Total messages stored for the session
        total: u64,
    },
    /// A transcript page fetch failed
    PageFailed {
        /// Context the page was requested for
        token: ContextToken,
        /// 1-based page number
        page: u32,
        /// Human-readable failure
        error: String,
    },

    /// The backend created a session for the first message
    ChatStarted {
        /// Context the send was issued from
        token: ContextToken,
        /// The new session
        session_id: SessionId,
        /// Assistant reply
        response_text: String,
    },
    /// The backend replied within an existing session
    ChatReplied {
        /// Context the send was issued from
        token: ContextToken,
        /// Assistant reply
        response_text: String,
    },
    /// A send failed
    SendFailed {
        /// Context the send was issued from
        token: ContextToken,
        /// The text that was sent, kept for retry
        text: String,
        /// Human-readable failure
        error: String,
    },

    /// A session was deleted
    SessionDeleted {
        /// The deleted session
        session_id: SessionId,
    },
    /// A delete failed
    DeleteFailed {
        /// The session that was not deleted
        session_id: SessionId,
        /// Human-readable failure
        error: String,
    },

    /// Feedback was accepted
    FeedbackSubmitted {
        /// The rated message
        ordinal: MessageOrdinal,
    },
    /// Feedback submission failed (the rating stays recorded)
    FeedbackFailed {
        /// The rated message
        ordinal: MessageOrdinal,
        /// Human-readable failure
        error: String,
    },
}

/// Reducer input
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A user intent
    Surface(SurfaceEvent),
    /// A backend result
    Completion(Completion),
}

impl From<SurfaceEvent> for Event {
    fn from(event: SurfaceEvent) -> Self {
        Self::Surface(event)
    }
}

impl From<Completion> for Event {
    fn from(completion: Completion) -> Self {
        Self::Completion(completion)
    }
}
