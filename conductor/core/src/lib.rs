//! Session Conductor - Headless Session and Transcript Controller
//!
//! This crate keeps a chat client's view of its conversations consistent while
//! session switches, paginated history loads, optimistic sends and feedback
//! submissions complete out of order. It is independent of any UI framework:
//! a terminal shell, a web front end or a test harness drive it the same way.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         UI Surface                               │
//! │                                                                  │
//! │        SurfaceEvent (up)              ConductorMessage (down)    │
//! └───────────────┬──────────────────────────────────▲───────────────┘
//!                 │                                  │
//! ┌───────────────┼──────────────────────────────────┼───────────────┐
//! │               ▼          CONDUCTOR               │               │
//! │   ┌──────────────────┐   effects   ┌─────────────┴────────────┐  │
//! │   │ reduce(state, ev)├────────────►│ spawned ChatApi requests │  │
//! │   └────────▲─────────┘             └─────────────┬────────────┘  │
//! │            │            Completion (channel)     │               │
//! │            └─────────────────────────────────────┘               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Conductor`]: Owns the state, runs effects, pushes snapshots
//! - [`ConductorState`]: The single source of truth
//! - [`reduce`]: The pure transition function
//! - [`ChatApi`]: Remote session/chat/feedback API ([`HttpChatApi`] over HTTP)
//! - [`TranscriptView`] / [`ViewSnapshot`]: What surfaces render
//!
//! # Quick Start
//!
//! ```ignore
//! use session_conductor::{load_config, Conductor, HttpChatApi, SurfaceEvent};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let backend = HttpChatApi::from_config(&config.api)?;
//!     let (tx, mut rx) = mpsc::channel(config.channel_capacity);
//!     let mut conductor = Conductor::new(backend, config, tx);
//!
//!     conductor.start().await?;
//!     conductor
//!         .handle_event(SurfaceEvent::SendMessage { text: "hi".into() })
//!         .await?;
//!
//!     loop {
//!         tokio::select! {
//!             Some(completion) = conductor.next_completion() => {
//!                 conductor.apply_completion(completion).await;
//!             }
//!             Some(msg) = rx.recv() => {
//!                 // Render message to UI
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: Chat API abstraction and HTTP client
//! - [`config`]: TOML, environment and CLI configuration
//! - [`conductor`]: The async driver
//! - [`events`]: Surface intents and backend completions
//! - [`feedback`]: Write-once ratings and submissions
//! - [`messages`]: Messages to surfaces and shared value types
//! - [`pagination`]: Older-history loading and ordinal numbering
//! - [`reducer`]: State transitions
//! - [`session`]: Session summaries and the transcript
//! - [`state`]: Controller state
//! - [`view`]: Read-only projections for rendering

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod conductor;
pub mod config;
pub mod events;
pub mod feedback;
pub mod messages;
pub mod pagination;
pub mod reducer;
pub mod session;
pub mod state;
pub mod view;

// Re-exports for convenience
pub use backend::{ApiError, ApiMessage, ChatApi, Credentials, HttpChatApi};
pub use conductor::Conductor;
pub use events::{Completion, ContextToken, Event, ListReason, SurfaceEvent};
pub use feedback::{FeedbackRecord, FeedbackSubmission};
pub use messages::{
    ConductorMessage, ConductorStatus, MessageOrdinal, MessageRole, NotifyLevel, Rating, SessionId,
};
pub use pagination::{PageCursor, Pagination, PaginationConfig, Refusal};
pub use reducer::{reduce, Effect, IgnoreReason, Transition};
pub use session::{ChatMessage, SessionSummary, Transcript};
pub use state::{ConductorState, RetryAction, StateSettings};
pub use view::{MessageView, TranscriptView, ViewSnapshot};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ApiConfig, ConductorConfig,
    ConductorToml, ConfigError, ConfigOverrides, ConfigSource,
};
