//! Sessions and Transcripts
//!
//! A session is a backend-owned conversation thread. The conductor only ever
//! holds a summary of each session plus the transcript of the active one.
//!
//! # Design Philosophy
//!
//! The transcript is an append-mostly log. Messages are appended at the tail
//! (sends and replies) or prepended at the head (older pages), never edited,
//! never removed one by one. Clearing happens only when the whole context is
//! replaced.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::messages::{MessageOrdinal, MessageRole, SessionId};

/// A session as listed in navigation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Backend-assigned identifier
    pub id: SessionId,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// When the session was last active, if the backend reports it
    #[serde(
        default,
        rename = "lastActiveAt",
        alias = "createdAt",
        alias = "lastUpdatedAt"
    )]
    pub last_active_at: Option<NaiveDateTime>,
}

impl SessionSummary {
    /// Create a summary with no timestamp
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(id),
            title: title.into(),
            last_active_at: None,
        }
    }
}

/// A message in the active transcript
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Stable position within the session
    pub ordinal: MessageOrdinal,
    /// Who sent this message
    pub role: MessageRole,
    /// Message content
    pub text: String,
    /// Exists only locally (greeting, failure reply); not stored by the backend
    #[serde(default)]
    pub synthetic: bool,
}

/// The ordered message list of the active context
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// Create an empty transcript
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A transcript holding only the synthetic greeting
    pub fn greeting(text: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.push_synthetic(MessageRole::Assistant, text.into());
        transcript
    }

    /// Drop every message
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Append a message the backend will also store
    pub fn push(&mut self, role: MessageRole, text: String) -> MessageOrdinal {
        self.push_with(role, text, false)
    }

    /// Append a local-only message
    pub fn push_synthetic(&mut self, role: MessageRole, text: String) -> MessageOrdinal {
        self.push_with(role, text, true)
    }

    fn push_with(&mut self, role: MessageRole, text: String, synthetic: bool) -> MessageOrdinal {
        let ordinal = self.next_ordinal();
        self.messages.push(ChatMessage {
            ordinal,
            role,
            text,
            synthetic,
        });
        ordinal
    }

    /// Mark a message as local-only (the backend never stored it)
    ///
    /// Returns `false` if no message has that ordinal.
    pub fn mark_local(&mut self, ordinal: MessageOrdinal) -> bool {
        match self.messages.iter_mut().find(|m| m.ordinal == ordinal) {
            Some(message) => {
                message.synthetic = true;
                true
            }
            None => false,
        }
    }

    /// Replace the whole transcript with a freshly fetched first page
    pub fn replace(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    /// Prepend an older batch, keeping only messages older than the current head
    ///
    /// Returns how many messages were added.
    pub fn prepend_older(&mut self, batch: Vec<ChatMessage>) -> usize {
        let head = self.first_ordinal();
        let mut older: Vec<ChatMessage> = batch
            .into_iter()
            .filter(|m| head.map_or(true, |h| m.ordinal < h))
            .collect();
        older.sort_by_key(|m| m.ordinal);
        older.dedup_by_key(|m| m.ordinal);

        let added = older.len();
        if added > 0 {
            older.append(&mut self.messages);
            self.messages = older;
        }
        added
    }

    /// Ordinal of the oldest loaded message
    #[must_use]
    pub fn first_ordinal(&self) -> Option<MessageOrdinal> {
        self.messages.first().map(|m| m.ordinal)
    }

    /// Ordinal the next appended message will get
    #[must_use]
    pub fn next_ordinal(&self) -> MessageOrdinal {
        self.messages
            .last()
            .map_or(MessageOrdinal(0), |m| m.ordinal.next())
    }

    /// Get message by ordinal
    #[must_use]
    pub fn get(&self, ordinal: MessageOrdinal) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.ordinal == ordinal)
    }

    /// Number of loaded messages the backend also stores
    #[must_use]
    pub fn persisted_len(&self) -> usize {
        self.messages.iter().filter(|m| !m.synthetic).count()
    }

    /// Get all messages
    #[must_use]
    pub fn as_slice(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of loaded messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing is loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn msg(ordinal: u64, text: &str) -> ChatMessage {
        ChatMessage {
            ordinal: MessageOrdinal(ordinal),
            role: MessageRole::User,
            text: text.to_string(),
            synthetic: false,
        }
    }

    fn texts(transcript: &Transcript) -> Vec<&str> {
        transcript.as_slice().iter().map(|m| m.text.as_str()).collect()
    }

    #[test]
    fn test_mark_local_drops_from_persisted_count() {
        let mut transcript = Transcript::new();
        transcript.push(MessageRole::Assistant, "stored".to_string());
        let unsent = transcript.push(MessageRole::User, "lost".to_string());
        assert_eq!(transcript.persisted_len(), 2);

        assert!(transcript.mark_local(unsent));
        assert_eq!(transcript.persisted_len(), 1);
        assert!(!transcript.mark_local(MessageOrdinal(9)));
    }

    #[test]
    fn test_greeting_is_synthetic() {
        let transcript = Transcript::greeting("Hi there");
        assert_eq!(transcript.len(), 1);
        assert!(transcript.as_slice()[0].synthetic);
        assert_eq!(transcript.as_slice()[0].role, MessageRole::Assistant);
        assert_eq!(transcript.persisted_len(), 0);
    }

    #[test]
    fn test_push_continues_ordinals() {
        let mut transcript = Transcript::new();
        transcript.replace(vec![msg(40, "a"), msg(41, "b")]);
        let ordinal = transcript.push(MessageRole::User, "c".to_string());
        assert_eq!(ordinal, MessageOrdinal(42));
        assert_eq!(transcript.next_ordinal(), MessageOrdinal(43));
    }

    #[test]
    fn test_prepend_older_keeps_order() {
        let mut transcript = Transcript::new();
        transcript.replace(vec![msg(2, "c"), msg(3, "d")]);
        let added = transcript.prepend_older(vec![msg(0, "a"), msg(1, "b")]);
        assert_eq!(added, 2);
        assert_eq!(texts(&transcript), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_prepend_older_drops_overlap() {
        let mut transcript = Transcript::new();
        transcript.replace(vec![msg(5, "f"), msg(6, "g")]);
        // A send between page loads shifted the server window by one.
        let added = transcript.prepend_older(vec![msg(3, "d"), msg(4, "e"), msg(5, "f")]);
        assert_eq!(added, 2);
        assert_eq!(texts(&transcript), vec!["d", "e", "f", "g"]);
    }

    #[test]
    fn test_summary_accepts_server_field_names() {
        let json = r#"{"id":"s1","title":"Trip","createdAt":"2024-05-01T10:20:30.123456"}"#;
        let summary: SessionSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.id, SessionId::new("s1"));
        assert!(summary.last_active_at.is_some());

        let bare: SessionSummary = serde_json::from_str(r#"{"id":"s2"}"#).unwrap();
        assert_eq!(bare.title, "");
        assert!(bare.last_active_at.is_none());
    }
}
