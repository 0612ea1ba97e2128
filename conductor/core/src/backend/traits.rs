//! Chat API Traits
//!
//! Trait definitions for the remote chat/session API. The Conductor only talks
//! to the backend through [`ChatApi`], so tests can swap in a scripted
//! implementation and the HTTP client stays free of business logic.
//!
//! # Design Philosophy
//!
//! The trait provides a common interface for:
//! - Listing, paging and deleting sessions
//! - Starting and continuing chats
//! - Submitting feedback
//!
//! Implementations handle transport details (URLs, auth headers, status codes).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feedback::FeedbackSubmission;
use crate::messages::{MessageRole, SessionId};
use crate::session::{ChatMessage, SessionSummary};

/// Errors returned by [`ChatApi`] implementations
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("server returned {status}: {detail}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Server-provided detail, or the raw body
        detail: String,
    },

    /// The request never produced a response
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not have the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),

    /// A session id that cannot be placed in a URL path
    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// A message as the API transfers it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Who sent it
    pub sender: MessageRole,
    /// Message content
    pub text: String,
}

impl ApiMessage {
    /// Create a wire message
    pub fn new(sender: MessageRole, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }
}

impl From<&ChatMessage> for ApiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            sender: msg.role,
            text: msg.text.clone(),
        }
    }
}

/// One page of a session's transcript
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    /// Messages on this page, oldest first
    #[serde(default)]
    pub messages: Vec<ApiMessage>,
    /// Total number of messages stored for the session
    pub total_messages: u64,
}

/// Response to starting a new chat
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChat {
    /// Identifier of the session the backend just created
    pub session_id: SessionId,
    /// The assistant's reply
    pub response_text: String,
}

/// Response to continuing a chat
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// The assistant's reply
    pub response_text: String,
}

/// Remote chat/session API
///
/// Implement this trait to plug in a different transport.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Get the backend name (e.g., "HTTP")
    fn name(&self) -> &str;

    /// List the user's sessions, most recent first
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ApiError>;

    /// Fetch one page of a session's transcript (1-based, counted from the newest)
    async fn get_session_messages(
        &self,
        session_id: &SessionId,
        page: u32,
        limit: u32,
    ) -> Result<MessagePage, ApiError>;

    /// Delete a session
    async fn delete_session(&self, session_id: &SessionId) -> Result<(), ApiError>;

    /// Start a new session with its first message
    async fn start_new_chat(&self, text: &str) -> Result<NewChat, ApiError>;

    /// Send a message to an existing session
    async fn continue_chat(&self, session_id: &SessionId, text: &str)
        -> Result<ChatReply, ApiError>;

    /// Submit a rating for an assistant reply
    async fn submit_feedback(&self, feedback: &FeedbackSubmission) -> Result<(), ApiError>;
}
