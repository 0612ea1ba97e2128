//! Feedback Tracker
//!
//! At most one rating per assistant message. The record reflects what the user
//! chose, not what the server acknowledged: a rating is written before the
//! submission goes out and stays written if the submission fails.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::backend::ApiMessage;
use crate::messages::{MessageOrdinal, MessageRole, Rating, SessionId};
use crate::session::{ChatMessage, Transcript};

/// Write-once ratings for the loaded transcript
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    ratings: BTreeMap<MessageOrdinal, Rating>,
}

impl FeedbackRecord {
    /// Create an empty record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rating unless one already exists
    ///
    /// Returns `false` (and changes nothing) if the ordinal was already rated.
    pub fn record(&mut self, ordinal: MessageOrdinal, rating: Rating) -> bool {
        if self.ratings.contains_key(&ordinal) {
            return false;
        }
        self.ratings.insert(ordinal, rating);
        true
    }

    /// Rating for a message, if any
    #[must_use]
    pub fn rating(&self, ordinal: MessageOrdinal) -> Option<Rating> {
        self.ratings.get(&ordinal).copied()
    }

    /// Forget every rating (the transcript they belong to is gone)
    pub fn clear(&mut self) {
        self.ratings.clear();
    }

    /// Number of rated messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    /// Whether nothing is rated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}

/// Body of a feedback submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSubmission {
    /// Session the rated message belongs to
    pub session_id: SessionId,
    /// Transcript as the user saw it when rating
    pub chat_history: Vec<ApiMessage>,
    /// The rated reply
    pub rated_message: ApiMessage,
    /// The verdict
    pub rating: Rating,
}

impl FeedbackSubmission {
    /// Build a submission from the loaded transcript
    #[must_use]
    pub fn new(
        session_id: SessionId,
        transcript: &Transcript,
        rated: &ChatMessage,
        rating: Rating,
    ) -> Self {
        Self {
            session_id,
            chat_history: transcript.as_slice().iter().map(ApiMessage::from).collect(),
            rated_message: ApiMessage::from(rated),
            rating,
        }
    }
}

/// Find a message that may be rated
///
/// Only stored assistant replies qualify: the backend files feedback under a
/// session, so local-only messages (greeting, failure reply) have nothing to
/// attach to.
#[must_use]
pub fn rateable(transcript: &Transcript, ordinal: MessageOrdinal) -> Option<&ChatMessage> {
    transcript
        .get(ordinal)
        .filter(|m| m.role == MessageRole::Assistant && !m.synthetic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_is_write_once() {
        let mut record = FeedbackRecord::new();
        assert!(record.record(MessageOrdinal(1), Rating::Good));
        assert!(!record.record(MessageOrdinal(1), Rating::Bad));
        assert_eq!(record.rating(MessageOrdinal(1)), Some(Rating::Good));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_only_assistant_messages_are_rateable() {
        let mut transcript = Transcript::greeting("Hello!");
        let user = transcript.push(MessageRole::User, "hi".to_string());
        let reply = transcript.push(MessageRole::Assistant, "hey".to_string());
        let failed = transcript.push_synthetic(MessageRole::Assistant, "oops".to_string());

        assert!(rateable(&transcript, user).is_none());
        assert!(rateable(&transcript, reply).is_some());
        assert!(rateable(&transcript, MessageOrdinal(0)).is_none());
        assert!(rateable(&transcript, failed).is_none());
        assert!(rateable(&transcript, MessageOrdinal(99)).is_none());
    }

    #[test]
    fn test_submission_wire_shape() {
        let mut transcript = Transcript::new();
        transcript.push(MessageRole::User, "hi".to_string());
        let reply = transcript.push(MessageRole::Assistant, "hey".to_string());
        let rated = transcript.get(reply).unwrap().clone();

        let submission =
            FeedbackSubmission::new(SessionId::new("s1"), &transcript, &rated, Rating::Bad);
        let json = serde_json::to_value(&submission).unwrap();

        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["rating"], "bad");
        assert_eq!(json["ratedMessage"]["sender"], "assistant");
        assert_eq!(json["chatHistory"].as_array().unwrap().len(), 2);
    }
}
