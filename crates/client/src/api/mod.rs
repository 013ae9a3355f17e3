//! HTTP wrapper for the armory REST API.
//!
//! One configured `reqwest` client shared by every subsystem. The wrapper
//! reads the bearer credential from the [`SessionStore`] on every call and
//! attaches it as `Authorization: Bearer <token>`, so individual components
//! never touch persisted session state.
//!
//! Backend errors arrive as `{"error": "..."}` bodies; the wrapper decodes
//! them into [`ApiError`] so call sites can surface the server's message
//! verbatim.

pub mod types;

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::config::{ClientConfig, ConfigError};
use crate::session::SessionStore;

use types::ErrorBody;

/// Errors that can occur when calling the armory API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend rejected the credential (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend rejected the request with a user-facing message.
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
}

impl ApiError {
    /// The server's own message, when there is one, for verbatim display.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } | Self::Unauthorized(message) => Some(message),
            Self::Http(_) | Self::Parse(_) => None,
        }
    }

    /// True when the credential was rejected and session-dependent state
    /// should be reset.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Client for the armory REST API.
///
/// Cheap to clone; all clones share one connection pool and session store.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

#[derive(Debug)]
struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                session,
            }),
        })
    }

    /// GET a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.request(Method::GET, path)).await
    }

    /// POST a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(self.request(Method::POST, path).json(body)).await
    }

    /// PUT a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn put<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(self.request(Method::PUT, path).json(body)).await
    }

    /// PATCH a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn patch<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(self.request(Method::PATCH, path).json(body)).await
    }

    /// DELETE a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.request(Method::DELETE, path)).await
    }

    /// POST a multipart form (weapon creation, avatar upload).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        self.execute(self.request(Method::POST, path).multipart(form))
            .await
    }

    /// PATCH a multipart form (partial weapon update, avatar upload).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn patch_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        self.execute(self.request(Method::PATCH, path).multipart(form))
            .await
    }

    /// Build a request with the bearer credential attached when present.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        let builder = self.inner.client.request(method, url);
        match self.inner.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and decode either the JSON payload or the error body.
    async fn execute<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        // Read as text first so parse failures carry the raw body in logs.
        let body = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| {
                debug!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse API response"
                );
                ApiError::Parse(e)
            });
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| format!("HTTP {status}"));

        debug!(status = %status, message = %message, "API request rejected");

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized(message));
        }

        Err(ApiError::Api { status, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Api {
            status: StatusCode::BAD_REQUEST,
            message: "insufficient stock".to_string(),
        };
        assert_eq!(err.to_string(), "API error (400 Bad Request): insufficient stock");
    }

    #[test]
    fn test_server_message_verbatim() {
        let err = ApiError::Api {
            status: StatusCode::BAD_REQUEST,
            message: "insufficient credits".to_string(),
        };
        assert_eq!(err.server_message(), Some("insufficient credits"));

        let err = ApiError::Unauthorized("session expired".to_string());
        assert_eq!(err.server_message(), Some("session expired"));
    }

    #[test]
    fn test_unauthorized_detection() {
        assert!(ApiError::Unauthorized(String::new()).is_unauthorized());
        let err = ApiError::Api {
            status: StatusCode::NOT_FOUND,
            message: "weapon not found".to_string(),
        };
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_api_client_is_clone_send_sync() {
        fn assert_clone<T: Clone>() {}
        fn assert_send_sync<T: Send + Sync>() {}
        assert_clone::<ApiClient>();
        assert_send_sync::<ApiClient>();
    }
}
