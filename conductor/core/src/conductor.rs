//! Conductor - The Orchestration Core
//!
//! The Conductor owns the controller state and is the only thing that changes
//! it. It orchestrates:
//! - Surface intents, applied through [`reduce`]
//! - Chat API calls, run on spawned tasks
//! - Completions, fed back through the same reducer in arrival order
//! - State snapshots and notifications pushed to the UI surface
//!
//! # Design Philosophy
//!
//! The Conductor is UI-agnostic. It communicates through:
//! - `ConductorMessage`: Commands sent TO the UI surface
//! - `SurfaceEvent`: Events received FROM the UI surface
//!
//! Requests are never cancelled. A result that arrives after the user moved on
//! carries an outdated context token and the reducer drops it.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::backend::ChatApi;
use crate::config::ConductorConfig;
use crate::events::{Completion, Event, SurfaceEvent};
use crate::messages::{ConductorMessage, NotifyLevel};
use crate::reducer::{reduce, Effect, Transition};
use crate::state::ConductorState;
use crate::view::TranscriptView;

/// The Conductor - headless session controller
pub struct Conductor<B: ChatApi> {
    /// Configuration
    config: ConductorConfig,
    /// Chat API
    backend: Arc<B>,
    /// Authoritative state
    state: ConductorState,
    /// Channel to send messages to UI surface
    tx: mpsc::Sender<ConductorMessage>,
    /// Completions from spawned requests
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    /// Requests spawned but not yet applied
    in_flight: usize,
}

impl<B: ChatApi + 'static> Conductor<B> {
    /// Create a new Conductor with the given backend
    pub fn new(backend: B, config: ConductorConfig, tx: mpsc::Sender<ConductorMessage>) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let state = ConductorState::new(config.state_settings());

        Self {
            config,
            backend: Arc::new(backend),
            state,
            tx,
            completion_tx,
            completion_rx,
            in_flight: 0,
        }
    }

    /// Get current state
    pub fn state(&self) -> &ConductorState {
        &self.state
    }

    /// Read-only view for rendering
    pub fn view(&self) -> TranscriptView<'_> {
        self.state.view()
    }

    /// Get configuration
    pub fn config(&self) -> &ConductorConfig {
        &self.config
    }

    /// Number of requests whose completion has not been applied yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Start the Conductor (load the session list and greet)
    pub async fn start(&mut self) -> anyhow::Result<()> {
        tracing::info!(backend = self.backend.name(), "Conductor starting");
        self.handle_event(SurfaceEvent::Bootstrap).await
    }

    /// Handle an event from the UI surface
    pub async fn handle_event(&mut self, event: SurfaceEvent) -> anyhow::Result<()> {
        self.dispatch(Event::Surface(event)).await;
        Ok(())
    }

    /// Wait for the next request to complete
    ///
    /// Cancel-safe, so it can sit in a `select!` next to surface input. Pass
    /// the result to [`Self::apply_completion`].
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completion_rx.recv().await
    }

    /// Apply a completion returned by [`Self::next_completion`]
    pub async fn apply_completion(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.dispatch(Event::Completion(completion)).await;
    }

    /// Apply every completion that has already arrived (non-blocking)
    ///
    /// Returns how many were applied.
    pub async fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.apply_completion(completion).await;
            applied += 1;
        }
        applied
    }

    /// Wait for one completion and apply it
    ///
    /// Returns `false` without waiting if nothing is in flight.
    pub async fn process_next_completion(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.completion_rx.recv().await {
            Some(completion) => {
                self.apply_completion(completion).await;
                true
            }
            None => false,
        }
    }

    /// Apply completions until no request is in flight
    ///
    /// Includes requests issued by the completions themselves, such as the
    /// session-list refresh that follows a new chat.
    pub async fn settle(&mut self) {
        while self.process_next_completion().await {}
    }

    /// Run one event through the reducer and act on the result
    async fn dispatch(&mut self, event: Event) {
        match reduce(&mut self.state, event) {
            Transition::Ignored(reason) => {
                tracing::debug!(?reason, "Event ignored");
            }
            Transition::Applied(effects) => {
                self.publish_state().await;
                for effect in effects {
                    self.run(effect).await;
                }
            }
        }
    }

    /// Perform one effect
    async fn run(&mut self, effect: Effect) {
        let backend = Arc::clone(&self.backend);

        match effect {
            Effect::FetchSessions { reason } => self.spawn(async move {
                match backend.list_sessions().await {
                    Ok(sessions) => Completion::SessionsLoaded { reason, sessions },
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to list sessions");
                        Completion::SessionsFailed {
                            reason,
                            error: e.to_string(),
                        }
                    }
                }
            }),

            Effect::FetchPage {
                token,
                session_id,
                page,
                limit,
            } => self.spawn(async move {
                match backend.get_session_messages(&session_id, page, limit).await {
                    Ok(fetched) => Completion::PageLoaded {
                        token,
                        page,
                        messages: fetched.messages,
                        total: fetched.total_messages,
                    },
                    Err(e) => {
                        tracing::warn!(session = %session_id, page, error = %e, "Failed to load page");
                        Completion::PageFailed {
                            token,
                            page,
                            error: e.to_string(),
                        }
                    }
                }
            }),

            Effect::StartChat { token, text } => self.spawn(async move {
                match backend.start_new_chat(&text).await {
                    Ok(created) => {
                        tracing::info!(session = %created.session_id, "Session created");
                        Completion::ChatStarted {
                            token,
                            session_id: created.session_id,
                            response_text: created.response_text,
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to start chat");
                        Completion::SendFailed {
                            token,
                            text,
                            error: e.to_string(),
                        }
                    }
                }
            }),

            Effect::ContinueChat {
                token,
                session_id,
                text,
            } => self.spawn(async move {
                match backend.continue_chat(&session_id, &text).await {
                    Ok(reply) => Completion::ChatReplied {
                        token,
                        response_text: reply.response_text,
                    },
                    Err(e) => {
                        tracing::warn!(session = %session_id, error = %e, "Failed to send message");
                        Completion::SendFailed {
                            token,
                            text,
                            error: e.to_string(),
                        }
                    }
                }
            }),

            Effect::DeleteSession { session_id } => self.spawn(async move {
                match backend.delete_session(&session_id).await {
                    Ok(()) => {
                        tracing::info!(session = %session_id, "Session deleted");
                        Completion::SessionDeleted { session_id }
                    }
                    Err(e) => {
                        tracing::warn!(session = %session_id, error = %e, "Failed to delete session");
                        Completion::DeleteFailed {
                            session_id,
                            error: e.to_string(),
                        }
                    }
                }
            }),

            Effect::SubmitFeedback {
                ordinal,
                submission,
            } => self.spawn(async move {
                match backend.submit_feedback(&submission).await {
                    Ok(()) => Completion::FeedbackSubmitted { ordinal },
                    Err(e) => {
                        tracing::warn!(%ordinal, error = %e, "Failed to submit feedback");
                        Completion::FeedbackFailed {
                            ordinal,
                            error: e.to_string(),
                        }
                    }
                }
            }),

            Effect::Notify { level, message } => self.notify(level, message).await,
        }
    }

    /// Run a request on its own task; its completion comes back on the channel
    fn spawn<F>(&mut self, request: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let tx = self.completion_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let completion = request.await;
            if tx.send(completion).is_err() {
                tracing::debug!("Conductor gone before request completed");
            }
        });
    }

    /// Push the current view to the surface
    async fn publish_state(&self) {
        let snapshot = self.state.view().snapshot();
        self.send(ConductorMessage::StateChanged {
            snapshot: Box::new(snapshot),
        })
        .await;
    }

    /// Send notification
    async fn notify(&self, level: NotifyLevel, message: String) {
        self.send(ConductorMessage::Notify {
            level,
            message,
            duration_ms: self.config.notice_duration_ms,
        })
        .await;
    }

    /// Send a message to the UI surface
    async fn send(&self, msg: ConductorMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ApiError, ApiMessage, ChatReply, MessagePage, NewChat};
    use crate::feedback::FeedbackSubmission;
    use crate::messages::{ConductorStatus, MessageRole, SessionId};
    use crate::session::SessionSummary;

    // Mock backend for testing
    struct MockApi;

    #[async_trait::async_trait]
    impl ChatApi for MockApi {
        fn name(&self) -> &str {
            "Mock"
        }

        async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ApiError> {
            Ok(vec![SessionSummary::new("s1", "First")])
        }

        async fn get_session_messages(
            &self,
            _session_id: &SessionId,
            _page: u32,
            _limit: u32,
        ) -> Result<MessagePage, ApiError> {
            Ok(MessagePage {
                messages: vec![
                    ApiMessage::new(MessageRole::User, "hi"),
                    ApiMessage::new(MessageRole::Assistant, "hello"),
                ],
                total_messages: 2,
            })
        }

        async fn delete_session(&self, _session_id: &SessionId) -> Result<(), ApiError> {
            Err(ApiError::Http {
                status: 403,
                detail: "not yours".to_string(),
            })
        }

        async fn start_new_chat(&self, _text: &str) -> Result<NewChat, ApiError> {
            Ok(NewChat {
                session_id: SessionId::new("s2"),
                response_text: "Hello!".to_string(),
            })
        }

        async fn continue_chat(
            &self,
            _session_id: &SessionId,
            text: &str,
        ) -> Result<ChatReply, ApiError> {
            Ok(ChatReply {
                response_text: format!("echo: {text}"),
            })
        }

        async fn submit_feedback(&self, _feedback: &FeedbackSubmission) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn conductor() -> (Conductor<MockApi>, mpsc::Receiver<ConductorMessage>) {
        let (tx, rx) = mpsc::channel(100);
        (Conductor::new(MockApi, ConductorConfig::default(), tx), rx)
    }

    #[tokio::test]
    async fn test_conductor_creation() {
        let (conductor, _rx) = conductor();
        assert_eq!(conductor.state().status(), ConductorStatus::Idle);
        assert_eq!(conductor.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_conductor_start() {
        let (mut conductor, mut rx) = conductor();
        conductor.start().await.unwrap();
        assert_eq!(conductor.state().status(), ConductorStatus::PageLoading);
        assert_eq!(conductor.in_flight(), 1);

        conductor.settle().await;

        let view = conductor.view();
        assert_eq!(view.status(), ConductorStatus::Idle);
        assert_eq!(view.sessions().len(), 1);
        assert_eq!(view.messages().len(), 1);

        // Should have received a snapshot for each applied transition
        let msg = rx.recv().await.unwrap();
        assert!(matches!(msg, ConductorMessage::StateChanged { ref snapshot }
            if snapshot.status == ConductorStatus::PageLoading));
    }

    #[tokio::test]
    async fn test_send_and_settle() {
        let (mut conductor, _rx) = conductor();
        conductor.start().await.unwrap();
        conductor.settle().await;

        conductor
            .handle_event(SurfaceEvent::SendMessage {
                text: "hey".to_string(),
            })
            .await
            .unwrap();
        conductor.settle().await;

        let view = conductor.view();
        assert_eq!(view.status(), ConductorStatus::Idle);
        assert_eq!(view.active_session_id(), Some(&SessionId::new("s2")));
        let texts: Vec<&str> = view.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec![crate::state::DEFAULT_GREETING, "hey", "Hello!"]);
    }

    #[tokio::test]
    async fn test_delete_failure_notifies() {
        let (mut conductor, mut rx) = conductor();
        conductor
            .handle_event(SurfaceEvent::DeleteSession {
                session_id: SessionId::new("s1"),
            })
            .await
            .unwrap();
        conductor.settle().await;

        let mut notified = false;
        while let Ok(msg) = rx.try_recv() {
            if let ConductorMessage::Notify {
                level, duration_ms, ..
            } = msg
            {
                assert_eq!(level, NotifyLevel::Error);
                assert_eq!(duration_ms, 3000);
                notified = true;
            }
        }
        assert!(notified);
        assert!(conductor.view().can_retry());
    }

    #[tokio::test]
    async fn test_ignored_event_publishes_nothing() {
        let (mut conductor, mut rx) = conductor();
        conductor
            .handle_event(SurfaceEvent::SendMessage {
                text: "   ".to_string(),
            })
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());
        assert!(!conductor.process_next_completion().await);
    }
}
