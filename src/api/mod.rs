//! CrewDesk REST API Client
//!
//! Authenticated HTTP client for the backend. Every request carries the
//! session's bearer token; a 401 on an authenticated call clears the session
//! and turns into [`ApiError::Unauthorized`] pointing at `/login`.
//!
//! # Endpoints
//!
//! - `auth`: login, logout, signup, invitation and password-reset tokens
//! - `people`: people and teams
//! - `events`: events and recurring series
//! - `messaging`: SMS broadcasts and invitations
//! - `billing`: plans, subscription, checkout and portal links
//! - `solver`: schedule solutions and solver runs
//! - `onboarding`: wizard progress and sample data
//! - `analytics`: admin analytics summary
//!
//! # Example
//!
//! ```rust,no_run
//! use crewdesk::api::ApiClient;
//! use crewdesk::config::ApiConfig;
//! use crewdesk::session::SessionManager;
//! use crewdesk::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = SessionManager::new(Arc::new(MemoryStore::new()));
//!     let client = ApiClient::new(&ApiConfig::default(), session)?;
//!
//!     let people = client.list_people().await?;
//!     println!("{} people", people.len());
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod auth;
pub mod billing;
pub mod dto;
pub mod error;
pub mod events;
pub mod messaging;
pub mod onboarding;
pub mod people;
pub mod solver;

pub use dto::*;
pub use error::{ApiError, ApiResult, LOGIN_PATH};

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ApiConfig;
use crate::session::SessionManager;

/// Authenticated client for the backend REST API
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionManager,
}

/// Error body shapes the backend is known to return
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiClient {
    /// Create a client for the configured backend
    pub fn new(config: &ApiConfig, session: SessionManager) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("crewdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Session this client authenticates with
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authenticated GET returning JSON
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        decode(response).await
    }

    /// Authenticated POST with a JSON body, returning JSON
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        decode(response).await
    }

    /// Authenticated POST whose response body is ignored
    pub async fn post_no_content<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<()> {
        self.send(self.request(Method::POST, path).json(body))
            .await?;
        Ok(())
    }

    /// Authenticated PUT with a JSON body, returning JSON
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .send(self.request(Method::PUT, path).json(body))
            .await?;
        decode(response).await
    }

    /// Authenticated PATCH with a JSON body, returning JSON
    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .send(self.request(Method::PATCH, path).json(body))
            .await?;
        decode(response).await
    }

    /// Authenticated DELETE
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    /// Unauthenticated GET (token validation, locale files)
    pub async fn public_get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .header("X-Request-Id", uuid::Uuid::new_v4().to_string())
            .send()
            .await?;
        let response = check_status(response).await?;
        decode(response).await
    }

    /// Unauthenticated POST; a 401 here is a plain error and leaves the session alone
    pub async fn public_post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .client
            .post(self.url(path))
            .header("X-Request-Id", uuid::Uuid::new_v4().to_string())
            .json(body)
            .send()
            .await?;
        let response = check_status(response).await?;
        decode(response).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.url(path))
            .header("X-Request-Id", uuid::Uuid::new_v4().to_string());

        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!("Request failed: {}", e);
            ApiError::from(e)
        })?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(url = %response.url(), "Received 401, clearing session");
            if let Err(e) = self.session.clear() {
                tracing::error!("Could not clear stored session: {}", e);
            }
            return Err(ApiError::Unauthorized {
                redirect: LOGIN_PATH.to_string(),
            });
        }

        check_status(response).await
    }
}

async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.error.or(body.message))
        .unwrap_or(text);

    tracing::error!(status = status.as_u16(), url = %url, error_message = %message, "API error");

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let bytes = response.bytes().await?;
    // Treat an empty body as JSON null so `Option<T>` and `()` targets decode
    let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_base_url_normalized() {
        let config = ApiConfig {
            base_url: "https://crew.example.org/".to_string(),
            request_timeout_secs: 5,
        };
        let client = ApiClient::new(&config, SessionManager::new(Arc::new(MemoryStore::new()))).unwrap();

        assert_eq!(client.base_url(), "https://crew.example.org");
        assert_eq!(client.url("/api/people"), "https://crew.example.org/api/people");
    }
}
