//! Chat API Integration
//!
//! The transport client: a thin request/response layer over the remote
//! session, chat and feedback endpoints, behind a common trait.
//!
//! # Usage
//!
//! ```ignore
//! use session_conductor::backend::{ChatApi, Credentials, HttpChatApi};
//!
//! let api = HttpChatApi::new("http://localhost:8000", Credentials::bearer(token), timeout)?;
//! let sessions = api.list_sessions().await?;
//! ```

mod http;
mod traits;

pub use http::{Credentials, HttpChatApi};
pub use traits::{ApiError, ApiMessage, ChatApi, ChatReply, MessagePage, NewChat};
