// Error handling module
// Defines the client error taxonomy and backend error body decoding

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// User-facing message for requests that never received a response
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";

/// Coarse classification of an [`ApiError`], exhaustive over every variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The session is gone and the user has to sign in again
    SessionLost,
    /// The backend denied the operation for this user
    Forbidden,
    /// No response was received from the backend
    Connectivity,
    /// Any other non-success response
    Backend,
    /// Local failure: decoding or internal
    Client,
}

/// Errors surfaced by the API client
#[derive(Error, Debug)]
pub enum ApiError {
    /// 401 that was not (or could not be) recovered by a token refresh
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// The refresh call itself failed
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// Request was queued behind a refresh that never produced a token
    #[error("Request abandoned: token refresh did not complete")]
    RefreshAbandoned,

    /// 403 from the backend
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Transport failure, no status code
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network(#[source] reqwest::Error),

    /// Any other non-success response
    #[error("API error: {status} - {message}")]
    Backend { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error body returned by the backend, `{"error": ...}` or `{"message": ...}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ApiError {
    /// Build an error from a non-success status and its raw body
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::FORBIDDEN => {
                // Backend uses a bare 403 for blocked users
                if body.trim().is_empty() {
                    ApiError::Forbidden("Access forbidden".to_string())
                } else {
                    ApiError::Forbidden(message)
                }
            }
            _ => ApiError::Backend {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Consume a non-success response and turn it into an error
    pub async fn from_response(response: Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::from_status(status, &body)
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthorized(_) | ApiError::RefreshFailed(_) | ApiError::RefreshAbandoned => {
                ErrorKind::SessionLost
            }
            ApiError::Forbidden(_) => ErrorKind::Forbidden,
            ApiError::Network(_) => ErrorKind::Connectivity,
            ApiError::Backend { .. } => ErrorKind::Backend,
            ApiError::Decode(_) | ApiError::Internal(_) => ErrorKind::Client,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn extract_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .error
        .or(parsed.message)
        .filter(|m| !m.trim().is_empty())
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
