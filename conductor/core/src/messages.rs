//! Conductor Messages
//!
//! Messages sent from the Conductor to UI surfaces, plus the small value types
//! (identifiers, roles, ratings, status) shared by every other module.
//!
//! # Design Philosophy
//!
//! Surfaces are renderers. They receive a full [`ViewSnapshot`] whenever the
//! controller state changes and transient notifications when something worth
//! telling the user happens. They never see completions or effects.

use serde::{Deserialize, Serialize};

use crate::view::ViewSnapshot;

/// Messages from Conductor to UI Surface
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ConductorMessage {
    /// Controller state changed; re-render from this snapshot
    StateChanged {
        /// Read-only copy of everything a surface may display
        snapshot: Box<ViewSnapshot>,
    },

    /// Transient notification
    ///
    /// Surfaces show it and drop it after `duration_ms`.
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Message content
        message: String,
        /// How long the notification stays visible
        duration_ms: u64,
    },
}

/// Session identifier, assigned by the backend
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Wrap a backend-issued identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Position of a message within its session's transcript
///
/// Ordinals are counted in server coordinates: the oldest stored message of a
/// session is 0. They stay stable while older pages are prepended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageOrdinal(pub u64);

impl MessageOrdinal {
    /// The ordinal that follows this one
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for MessageOrdinal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User input
    User,
    /// AI assistant
    Assistant,
}

/// A user's verdict on an assistant reply
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// Helpful reply
    Good,
    /// Unhelpful reply
    Bad,
}

impl std::str::FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "good" | "up" | "+" => Ok(Self::Good),
            "bad" | "down" | "-" => Ok(Self::Bad),
            other => Err(format!("unknown rating: {other}")),
        }
    }
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
    /// Success
    Success,
}

/// Conductor operational status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConductorStatus {
    /// Settled and ready for input
    #[default]
    Idle,
    /// Bootstrapping the session list and greeting
    PageLoading,
    /// Switching sessions and fetching the first transcript page
    SessionLoading,
    /// A send is in flight
    Loading,
    /// The last operation failed
    Error,
}

impl ConductorStatus {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::PageLoading => "Starting up...",
            Self::SessionLoading => "Loading conversation...",
            Self::Loading => "Thinking...",
            Self::Error => "Error",
        }
    }

    /// Whether a session switch or bootstrap is replacing the transcript
    #[must_use]
    pub fn is_switching(&self) -> bool {
        matches!(self, Self::PageLoading | Self::SessionLoading)
    }
}
