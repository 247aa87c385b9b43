//! HTTP implementation of the backend contract
//!
//! Uses one `reqwest` client for both hosts. Every request carries a
//! bounded timeout and is sent exactly once.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};

use crate::auth::AccountProfile;
use crate::backend::{Backend, BackendRequest, IDENTITY_PATH};
use crate::config::BackendConfig;
use crate::error::{ReelkitError, Result, GENERIC_BACKEND_MESSAGE, NETWORK_ERROR_MESSAGE};

/// Backend reached over HTTP
///
/// # Examples
///
/// ```no_run
/// use reelkit::backend::{Backend, BackendRequest, HttpBackend, Operation};
/// use reelkit::config::BackendConfig;
///
/// # async fn example() -> reelkit::error::Result<()> {
/// let backend = HttpBackend::new(&BackendConfig::default())?;
/// let value = backend
///     .dispatch(BackendRequest {
///         operation: Operation::HashtagsGenerate,
///         payload: serde_json::json!({"content": "sunset", "platform": "tiktok", "count": 10}),
///         bearer_token: None,
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    api_url: String,
    ai_engine_url: String,
}

impl HttpBackend {
    /// Builds a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ReelkitError::Http`] if the client cannot be constructed.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("reelkit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ReelkitError::Http)?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            ai_engine_url: config.ai_engine_url.trim_end_matches('/').to_string(),
        })
    }

    fn engine_url(&self, path: &str) -> String {
        format!("{}{}", self.ai_engine_url, path)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_identity(&self, token: &str) -> Result<AccountProfile> {
        let url = self.api_url(IDENTITY_PATH);
        tracing::debug!(%url, "Fetching identity");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_success_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn dispatch(&self, request: BackendRequest) -> Result<serde_json::Value> {
        let url = self.engine_url(request.operation.path());
        tracing::debug!(operation = %request.operation, %url, "Dispatching AI request");

        let mut builder = self.client.post(&url).json(&request.payload);
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let body = read_success_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Maps a transport failure to [`ReelkitError::BackendUnavailable`]
fn transport_error(err: reqwest::Error) -> anyhow::Error {
    if err.is_timeout() {
        tracing::error!("Backend request timed out: {}", err);
    } else {
        tracing::error!("Backend request failed: {}", err);
    }
    ReelkitError::BackendUnavailable(NETWORK_ERROR_MESSAGE.to_string()).into()
}

/// Returns the body of a 2xx response, or the mapped error otherwise
async fn read_success_body(response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if status.is_success() {
        return Ok(body);
    }

    let message = extract_message(&body);
    tracing::error!("Backend returned error {}: {}", status, message);

    if status == StatusCode::UNAUTHORIZED {
        return Err(ReelkitError::Unauthenticated(message).into());
    }
    Err(ReelkitError::BackendRejected {
        status: status.as_u16(),
        message,
    }
    .into())
}

/// Pulls the human-readable `message` out of an error body
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_BACKEND_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_from_json() {
        assert_eq!(
            extract_message(r#"{"message":"Content too long"}"#),
            "Content too long"
        );
    }

    #[test]
    fn test_extract_message_falls_back_to_generic() {
        assert_eq!(extract_message("<html>502</html>"), GENERIC_BACKEND_MESSAGE);
        assert_eq!(extract_message(r#"{"error":"x"}"#), GENERIC_BACKEND_MESSAGE);
        assert_eq!(extract_message(r#"{"message":""}"#), GENERIC_BACKEND_MESSAGE);
    }

    #[test]
    fn test_urls_trim_trailing_slash() {
        let config = BackendConfig {
            api_url: "http://api.test/".to_string(),
            ai_engine_url: "http://ai.test/".to_string(),
            timeout_seconds: 5,
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(
            backend.engine_url("/api/content/analyze"),
            "http://ai.test/api/content/analyze"
        );
        assert_eq!(backend.api_url(IDENTITY_PATH), "http://api.test/api/auth/me");
    }
}
