//! State Transitions
//!
//! [`reduce`] is the whole session state machine: it takes the current state
//! and one [`Event`], mutates the state in place and returns the side effects
//! the driver must run. It performs no I/O, spawns nothing and reads no clock,
//! so every transition can be tested without a runtime.
//!
//! Completions tied to a transcript carry the [`ContextToken`] they were
//! issued under. One whose token no longer matches the state is ignored.

use crate::events::{Completion, ContextToken, Event, ListReason, SurfaceEvent};
use crate::feedback::{rateable, FeedbackSubmission};
use crate::messages::{ConductorStatus, MessageOrdinal, MessageRole, NotifyLevel, Rating, SessionId};
use crate::pagination::Refusal;
use crate::session::{SessionSummary, Transcript};
use crate::state::{ConductorState, RetryAction, SEND_FAILURE_REPLY};

/// Notification shown when feedback is accepted
pub const FEEDBACK_THANKS: &str = "Thanks for your feedback!";

/// Work the driver performs on behalf of a transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the session list
    FetchSessions {
        /// Which transition the result settles
        reason: ListReason,
    },
    /// Fetch one transcript page
    FetchPage {
        /// Context the page is for
        token: ContextToken,
        /// Session to page
        session_id: SessionId,
        /// 1-based page number
        page: u32,
        /// Page size
        limit: u32,
    },
    /// Create a session with its first message
    StartChat {
        /// Context the send was issued from
        token: ContextToken,
        /// Message text
        text: String,
    },
    /// Send a message to an existing session
    ContinueChat {
        /// Context the send was issued from
        token: ContextToken,
        /// Target session
        session_id: SessionId,
        /// Message text
        text: String,
    },
    /// Delete a session
    DeleteSession {
        /// Session to delete
        session_id: SessionId,
    },
    /// Submit a rating
    SubmitFeedback {
        /// The rated message
        ordinal: MessageOrdinal,
        /// Request body
        submission: Box<FeedbackSubmission>,
    },
    /// Show a transient notification
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Message content
        message: String,
    },
}

/// Why an event left the state untouched
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The completion belongs to a context that is no longer active
    Stale,
    /// A send is already in flight
    Busy,
    /// The transcript is being replaced
    Switching,
    /// Nothing but whitespace was submitted
    EmptyInput,
    /// The session is already open
    AlreadySelected,
    /// The message already carries a rating
    AlreadyRated,
    /// No loaded assistant message has that ordinal
    NotRateable,
    /// The scroll position is not near the top
    NotNearTop,
    /// The pagination loader refused
    Pagination(Refusal),
    /// No failed operation is waiting for a retry
    NothingToRetry,
}

/// Outcome of [`reduce`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// State changed (or may have); run these effects in order
    Applied(Vec<Effect>),
    /// State is exactly as before
    Ignored(IgnoreReason),
}

impl Transition {
    fn none() -> Self {
        Self::Applied(Vec::new())
    }

    fn one(effect: Effect) -> Self {
        Self::Applied(vec![effect])
    }

    /// Whether the event was applied
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// Effects to run (empty when ignored)
    #[must_use]
    pub fn into_effects(self) -> Vec<Effect> {
        match self {
            Self::Applied(effects) => effects,
            Self::Ignored(_) => Vec::new(),
        }
    }
}

/// Apply one event to the state
pub fn reduce(state: &mut ConductorState, event: Event) -> Transition {
    match event {
        Event::Surface(event) => on_surface(state, event),
        Event::Completion(completion) => on_completion(state, completion),
    }
}

fn on_surface(state: &mut ConductorState, event: SurfaceEvent) -> Transition {
    match event {
        SurfaceEvent::Bootstrap => bootstrap(state),
        SurfaceEvent::SelectSession { session_id } => {
            if state.active_session_id.as_ref() == Some(&session_id) {
                return Transition::Ignored(IgnoreReason::AlreadySelected);
            }
            open_session(state, session_id)
        }
        SurfaceEvent::NewChat => {
            new_chat(state);
            Transition::none()
        }
        SurfaceEvent::SendMessage { text } => send_message(state, text),
        SurfaceEvent::DeleteSession { session_id } => {
            Transition::one(Effect::DeleteSession { session_id })
        }
        SurfaceEvent::InputChanged { text } => {
            state.pending_input = text;
            Transition::none()
        }
        SurfaceEvent::Scrolled { offset_from_top } => {
            if !state.pagination.is_near_top(offset_from_top) {
                return Transition::Ignored(IgnoreReason::NotNearTop);
            }
            load_older(state)
        }
        SurfaceEvent::LoadOlder => load_older(state),
        SurfaceEvent::Rate { ordinal, rating } => rate(state, ordinal, rating),
        SurfaceEvent::Retry => retry(state),
        SurfaceEvent::RefreshSessions => Transition::one(Effect::FetchSessions {
            reason: ListReason::Refresh,
        }),
    }
}

fn bootstrap(state: &mut ConductorState) -> Transition {
    if state.status == ConductorStatus::Loading {
        return Transition::Ignored(IgnoreReason::Busy);
    }
    if state.status.is_switching() {
        return Transition::Ignored(IgnoreReason::Switching);
    }
    state.status = ConductorStatus::PageLoading;
    state.error = None;
    state.retry = None;
    Transition::one(Effect::FetchSessions {
        reason: ListReason::Bootstrap(state.token()),
    })
}

/// Switch to `session_id` and fetch its newest page
fn open_session(state: &mut ConductorState, session_id: SessionId) -> Transition {
    state.switch_context(Some(session_id.clone()), Transcript::new());
    state.status = ConductorStatus::SessionLoading;
    state.error = None;
    state.retry = None;
    Transition::one(Effect::FetchPage {
        token: state.token(),
        session_id,
        page: 1,
        limit: state.pagination.config().page_size,
    })
}

fn new_chat(state: &mut ConductorState) {
    let greeting = state.greeting_transcript();
    state.switch_context(None, greeting);
    state.settle();
}

fn send_message(state: &mut ConductorState, text: String) -> Transition {
    if text.trim().is_empty() {
        return Transition::Ignored(IgnoreReason::EmptyInput);
    }
    if state.status == ConductorStatus::Loading {
        return Transition::Ignored(IgnoreReason::Busy);
    }
    // The first page of the incoming session would overwrite the message
    if state.status == ConductorStatus::SessionLoading {
        return Transition::Ignored(IgnoreReason::Switching);
    }

    if state.active_session_id.is_none() && state.transcript.is_empty() {
        state.transcript = state.greeting_transcript();
    }
    let ordinal = state.transcript.push(MessageRole::User, text.clone());
    state.pending_send = Some(ordinal);
    state.pending_input.clear();
    state.status = ConductorStatus::Loading;
    state.error = None;
    state.retry = None;

    let token = state.token();
    let effect = match state.active_session_id.clone() {
        Some(session_id) => Effect::ContinueChat {
            token,
            session_id,
            text,
        },
        None => Effect::StartChat { token, text },
    };
    Transition::one(effect)
}

fn load_older(state: &mut ConductorState) -> Transition {
    let has_session = state.active_session_id.is_some();
    if let Err(refusal) = state.pagination.check_older(has_session, state.status) {
        return Transition::Ignored(IgnoreReason::Pagination(refusal));
    }
    let Some(session_id) = state.active_session_id.clone() else {
        return Transition::Ignored(IgnoreReason::Pagination(Refusal::NoSession));
    };
    let page = state.pagination.begin_older();
    Transition::one(Effect::FetchPage {
        token: state.token(),
        session_id,
        page,
        limit: state.pagination.config().page_size,
    })
}

fn rate(state: &mut ConductorState, ordinal: MessageOrdinal, rating: Rating) -> Transition {
    if state.feedback.rating(ordinal).is_some() {
        return Transition::Ignored(IgnoreReason::AlreadyRated);
    }
    let Some(session_id) = state.active_session_id.clone() else {
        return Transition::Ignored(IgnoreReason::NotRateable);
    };
    let Some(rated) = rateable(&state.transcript, ordinal) else {
        return Transition::Ignored(IgnoreReason::NotRateable);
    };
    let submission = FeedbackSubmission::new(session_id, &state.transcript, rated, rating);
    state.feedback.record(ordinal, rating);
    Transition::one(Effect::SubmitFeedback {
        ordinal,
        submission: Box::new(submission),
    })
}

fn retry(state: &mut ConductorState) -> Transition {
    let Some(action) = state.retry.clone() else {
        return Transition::Ignored(IgnoreReason::NothingToRetry);
    };

    let transition = match action {
        RetryAction::Bootstrap => bootstrap(state),
        RetryAction::ReloadSession(session_id) => open_session(state, session_id),
        RetryAction::LoadOlder => load_older(state),
        RetryAction::Resend(text) => send_message(state, text),
        RetryAction::Delete(session_id) => Transition::one(Effect::DeleteSession { session_id }),
        RetryAction::RefreshSessions => Transition::one(Effect::FetchSessions {
            reason: ListReason::Refresh,
        }),
    };

    if transition.is_applied() {
        state.retry = None;
        state.error = None;
        if state.status == ConductorStatus::Error {
            state.status = ConductorStatus::Idle;
        }
    }
    transition
}

fn on_completion(state: &mut ConductorState, completion: Completion) -> Transition {
    match completion {
        Completion::SessionsLoaded { reason, sessions } => sessions_loaded(state, reason, sessions),
        Completion::SessionsFailed { reason, error } => sessions_failed(state, reason, error),

        Completion::PageLoaded {
            token,
            page,
            messages,
            total,
        } => {
            if !state.is_current(&token) {
                return Transition::Ignored(IgnoreReason::Stale);
            }
            let batch = messages.into_iter().map(|m| (m.sender, m.text)).collect();
            if is_first_page(state) {
                let numbered = state.pagination.number_page(page, total, batch);
                state.transcript.replace(numbered);
                let oldest = state.transcript.first_ordinal();
                state.pagination.page_loaded(page, oldest);
                state.settle();
            } else if state.pagination.cursor().fetching {
                state
                    .pagination
                    .merge_older(&mut state.transcript, page, total, batch);
            } else {
                return Transition::Ignored(IgnoreReason::Stale);
            }
            Transition::none()
        }

        Completion::PageFailed { token, error, .. } => {
            if !state.is_current(&token) {
                return Transition::Ignored(IgnoreReason::Stale);
            }
            if is_first_page(state) {
                match state.active_session_id.clone() {
                    Some(session_id) => state.fail(error, RetryAction::ReloadSession(session_id)),
                    None => return Transition::Ignored(IgnoreReason::Stale),
                }
            } else if state.pagination.cursor().fetching {
                state.pagination.abort_older();
                state.record_failure(error, RetryAction::LoadOlder);
            } else {
                return Transition::Ignored(IgnoreReason::Stale);
            }
            Transition::none()
        }

        Completion::ChatStarted {
            token,
            session_id,
            response_text,
        } => {
            if !state.is_current(&token) {
                return Transition::Ignored(IgnoreReason::Stale);
            }
            // Reply and session id land together; the list refresh follows.
            state.pending_send = None;
            state.transcript.push(MessageRole::Assistant, response_text);
            state.active_session_id = Some(session_id);
            state.pagination.mark_complete();
            state.awaiting_refresh = true;
            Transition::one(Effect::FetchSessions {
                reason: ListReason::AfterStart(state.token()),
            })
        }

        Completion::ChatReplied {
            token,
            response_text,
        } => {
            if !state.is_current(&token) {
                return Transition::Ignored(IgnoreReason::Stale);
            }
            state.pending_send = None;
            state.transcript.push(MessageRole::Assistant, response_text);
            state.settle();
            Transition::none()
        }

        Completion::SendFailed { token, text, error } => {
            if !state.is_current(&token) {
                return Transition::Ignored(IgnoreReason::Stale);
            }
            // The backend stores nothing for a failed exchange
            if let Some(unsent) = state.pending_send.take() {
                state.transcript.mark_local(unsent);
            }
            state
                .transcript
                .push_synthetic(MessageRole::Assistant, SEND_FAILURE_REPLY.to_string());
            state.awaiting_refresh = false;
            state.fail(error, RetryAction::Resend(text));
            Transition::none()
        }

        Completion::SessionDeleted { session_id } => {
            if state.active_session_id.as_ref() == Some(&session_id) {
                new_chat(state);
            }
            state.sessions.retain(|s| s.id != session_id);
            Transition::one(Effect::FetchSessions {
                reason: ListReason::Refresh,
            })
        }

        Completion::DeleteFailed { session_id, error } => {
            let message = format!("Could not delete session: {error}");
            state.record_failure(error, RetryAction::Delete(session_id));
            Transition::one(Effect::Notify {
                level: NotifyLevel::Error,
                message,
            })
        }

        Completion::FeedbackSubmitted { .. } => Transition::one(Effect::Notify {
            level: NotifyLevel::Success,
            message: FEEDBACK_THANKS.to_string(),
        }),

        Completion::FeedbackFailed { error, .. } => Transition::one(Effect::Notify {
            level: NotifyLevel::Error,
            message: format!("Could not submit feedback: {error}"),
        }),
    }
}

/// The active context is still waiting for its newest page
fn is_first_page(state: &ConductorState) -> bool {
    state.status == ConductorStatus::SessionLoading && state.pagination.cursor().pages_loaded == 0
}

fn sessions_loaded(
    state: &mut ConductorState,
    reason: ListReason,
    sessions: Vec<SessionSummary>,
) -> Transition {
    state.sessions = sessions;
    match reason {
        ListReason::Bootstrap(token) => {
            if state.is_current(&token) && state.status == ConductorStatus::PageLoading {
                if state.transcript.is_empty() {
                    state.transcript = state.greeting_transcript();
                }
                state.settle();
            }
        }
        ListReason::AfterStart(token) => {
            if state.is_current(&token) && state.awaiting_refresh {
                state.awaiting_refresh = false;
                if state.status == ConductorStatus::Loading {
                    state.settle();
                }
            }
        }
        ListReason::Refresh => {}
    }
    Transition::none()
}

fn sessions_failed(state: &mut ConductorState, reason: ListReason, error: String) -> Transition {
    match reason {
        ListReason::Bootstrap(token) => {
            if !state.is_current(&token) {
                return Transition::Ignored(IgnoreReason::Stale);
            }
            match state.status {
                ConductorStatus::PageLoading => state.fail(error, RetryAction::Bootstrap),
                // A send started during bootstrap owns the status
                ConductorStatus::Loading => state.record_failure(error, RetryAction::Bootstrap),
                _ => return Transition::Ignored(IgnoreReason::Stale),
            }
        }
        ListReason::AfterStart(token) => {
            if !state.is_current(&token) || !state.awaiting_refresh {
                return Transition::Ignored(IgnoreReason::Stale);
            }
            state.awaiting_refresh = false;
            state.fail(error, RetryAction::RefreshSessions);
        }
        ListReason::Refresh => state.record_failure(error, RetryAction::RefreshSessions),
    }
    Transition::none()
}
