//! API Error Types
//!
//! Errors surfaced by the authenticated HTTP client. Every failure is
//! reported once and the operation is abandoned; nothing here retries.

use thiserror::Error;

use crate::storage::StorageError;

/// Path the client is sent to when the backend rejects the session
pub const LOGIN_PATH: &str = "/login";

/// API client error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Backend rejected the bearer token; the session has been cleared
    #[error("Session expired, redirecting to {redirect}")]
    Unauthorized { redirect: String },

    /// Backend answered with a non-success status
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// Request timed out
    #[error("Request timeout")]
    Timeout,

    /// Backend could not be reached
    #[error("Backend unavailable")]
    Unavailable,

    /// Transport-level failure
    #[error("Request failed: {0}")]
    Request(reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Input rejected before any request was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// Session store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_connect() {
            ApiError::Unavailable
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Request(e)
        }
    }
}

impl ApiError {
    /// Redirect target if this error ended the session
    pub fn redirect(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { redirect } => Some(redirect),
            _ => None,
        }
    }

    /// HTTP status, when the backend produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }

    /// Short text suitable for a toast
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized { .. } => "Your session has expired. Please log in again.".to_string(),
            ApiError::Status { status: 404, .. } => "Not found".to_string(),
            ApiError::Status { status: 403, .. } => "You do not have permission to do that".to_string(),
            ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Status { status, .. } => format!("Request failed ({})", status),
            ApiError::Timeout => "The server took too long to respond".to_string(),
            ApiError::Unavailable => "Unable to reach the server".to_string(),
            ApiError::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
