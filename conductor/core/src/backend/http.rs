//! HTTP Chat API Implementation
//!
//! [`ChatApi`] over the REST endpoints of the chat backend:
//!
//! - `GET    /api/sessions/` - list sessions
//! - `GET    /api/sessions/{id}?page=&limit=` - one transcript page
//! - `DELETE /api/sessions/{id}` - delete a session
//! - `POST   /api/chat/new` - start a new chat
//! - `POST   /api/chat/{id}` - continue a chat
//! - `POST   /api/feedback/` - submit feedback
//!
//! No retries, no caching. Every non-success status becomes
//! [`ApiError::Http`] carrying the server's `detail` text.

use std::time::Duration;

use async_trait::async_trait;

use super::traits::{ApiError, ChatApi, ChatReply, MessagePage, NewChat};
use crate::config::ApiConfig;
use crate::feedback::FeedbackSubmission;
use crate::messages::SessionId;
use crate::session::SessionSummary;

/// Bearer credentials handed to the client by whoever owns the token
#[derive(Clone, Default)]
pub struct Credentials {
    token: Option<String>,
}

impl Credentials {
    /// Credentials for a bearer token
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// No authentication
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// HTTP client for the chat backend
#[derive(Clone)]
pub struct HttpChatApi {
    /// Base URL without trailing slash
    base_url: String,
    /// Auth header source
    credentials: Credentials,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpChatApi {
    /// Create a client for `base_url`
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            http_client,
        })
    }

    /// Create from [`ApiConfig`]
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let credentials = config
            .token
            .as_deref()
            .map_or_else(Credentials::anonymous, Credentials::bearer);
        Self::new(
            config.base_url.clone(),
            credentials,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn sessions_url(&self) -> String {
        format!("{}/api/sessions/", self.base_url)
    }

    fn session_url(&self, session_id: &SessionId) -> Result<String, ApiError> {
        Ok(format!(
            "{}/api/sessions/{}",
            self.base_url,
            path_segment(session_id)?
        ))
    }

    fn new_chat_url(&self) -> String {
        format!("{}/api/chat/new", self.base_url)
    }

    fn chat_url(&self, session_id: &SessionId) -> Result<String, ApiError> {
        Ok(format!(
            "{}/api/chat/{}",
            self.base_url,
            path_segment(session_id)?
        ))
    }

    fn feedback_url(&self) -> String {
        format!("{}/api/feedback/", self.base_url)
    }

    /// Send a request, mapping non-success statuses to [`ApiError::Http`]
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let response = self.credentials.apply(request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status,
                detail: error_detail(&body),
            });
        }

        Ok(response)
    }
}

/// Validate a session id for use as a single URL path segment
fn path_segment(session_id: &SessionId) -> Result<&str, ApiError> {
    let raw = session_id.as_str();
    let valid = !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(raw)
    } else {
        Err(ApiError::InvalidSessionId(raw.to_string()))
    }
}

/// Extract a human-readable message from an error body
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match value.get("detail") {
            Some(serde_json::Value::String(detail)) => detail.clone(),
            Some(other) => other.to_string(),
            None => body.to_string(),
        },
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ApiError> {
        let response = self.execute(self.http_client.get(self.sessions_url())).await?;
        Ok(response.json().await?)
    }

    async fn get_session_messages(
        &self,
        session_id: &SessionId,
        page: u32,
        limit: u32,
    ) -> Result<MessagePage, ApiError> {
        let request = self
            .http_client
            .get(self.session_url(session_id)?)
            .query(&[("page", page), ("limit", limit)]);
        let response = self.execute(request).await?;
        Ok(response.json().await?)
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<(), ApiError> {
        self.execute(self.http_client.delete(self.session_url(session_id)?))
            .await?;
        Ok(())
    }

    async fn start_new_chat(&self, text: &str) -> Result<NewChat, ApiError> {
        let request = self
            .http_client
            .post(self.new_chat_url())
            .json(&serde_json::json!({ "message": text }));
        let response = self.execute(request).await?;
        Ok(response.json().await?)
    }

    async fn continue_chat(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<ChatReply, ApiError> {
        let request = self
            .http_client
            .post(self.chat_url(session_id)?)
            .json(&serde_json::json!({ "message": text }));
        let response = self.execute(request).await?;
        Ok(response.json().await?)
    }

    async fn submit_feedback(&self, feedback: &FeedbackSubmission) -> Result<(), ApiError> {
        let request = self.http_client.post(self.feedback_url()).json(feedback);
        self.execute(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpChatApi {
        HttpChatApi::new(
            "http://localhost:8000/",
            Credentials::anonymous(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let api = client();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.sessions_url(), "http://localhost:8000/api/sessions/");
        assert_eq!(
            api.session_url(&SessionId::new("665f1c")).unwrap(),
            "http://localhost:8000/api/sessions/665f1c"
        );
        assert_eq!(api.new_chat_url(), "http://localhost:8000/api/chat/new");
        assert_eq!(
            api.chat_url(&SessionId::new("abc")).unwrap(),
            "http://localhost:8000/api/chat/abc"
        );
        assert_eq!(api.feedback_url(), "http://localhost:8000/api/feedback/");
    }

    #[test]
    fn test_rejects_unsafe_session_ids() {
        let api = client();
        assert!(matches!(
            api.session_url(&SessionId::new("../admin")),
            Err(ApiError::InvalidSessionId(_))
        ));
        assert!(matches!(
            api.chat_url(&SessionId::new("")),
            Err(ApiError::InvalidSessionId(_))
        ));
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(
            error_detail(r#"{"detail": "Session not found."}"#),
            "Session not found."
        );
        assert_eq!(error_detail("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_detail(""), "no response body");
        assert!(error_detail(r#"{"detail": [{"msg": "field required"}]}"#).contains("field required"));
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let creds = Credentials::bearer("secret-token");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_from_config() {
        let config = ApiConfig {
            base_url: "https://chat.example.com".to_string(),
            token: Some("t".to_string()),
            timeout_secs: 30,
        };
        let api = HttpChatApi::from_config(&config).unwrap();
        assert_eq!(api.base_url(), "https://chat.example.com");
        assert_eq!(api.name(), "HTTP");
    }
}
