use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::types::Resource;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing authorization code")]
    MissingCode,

    #[error("Missing token")]
    MissingToken,

    #[error("OAuth state verification failed: {0}")]
    InvalidState(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("GitHub rejected the credentials: {0}")]
    UpstreamAuth(String),

    #[error("GitHub API rate limit exceeded")]
    UpstreamRateLimited,

    #[error("Not found on GitHub: {0}")]
    UpstreamNotFound(String),

    #[error("GitHub unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("GitHub API error ({status}): {message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("Failed to load: {}", join_resources(.failed))]
    PartialAggregationFailure { failed: Vec<Resource> },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable, serializable category of an [`AppError`].
///
/// This is what crosses process boundaries: it is the `error` field of every
/// JSON error body the relay returns, and what a dashboard panel records when
/// its fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    MissingCode,
    MissingToken,
    InvalidState,
    InvalidRequest,
    TokenExchange,
    UpstreamAuth,
    UpstreamRateLimited,
    UpstreamNotFound,
    UpstreamUnavailable,
    UpstreamRejected,
    PartialAggregationFailure,
    Internal,
}

/// JSON body of an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config(_) => ErrorKind::Config,
            AppError::MissingCode => ErrorKind::MissingCode,
            AppError::MissingToken => ErrorKind::MissingToken,
            AppError::InvalidState(_) => ErrorKind::InvalidState,
            AppError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            AppError::TokenExchange(_) => ErrorKind::TokenExchange,
            AppError::UpstreamAuth(_) => ErrorKind::UpstreamAuth,
            AppError::UpstreamRateLimited => ErrorKind::UpstreamRateLimited,
            AppError::UpstreamNotFound(_) => ErrorKind::UpstreamNotFound,
            AppError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            AppError::UpstreamRejected { .. } | AppError::Serialization(_) => {
                ErrorKind::UpstreamRejected
            }
            AppError::PartialAggregationFailure { .. } => ErrorKind::PartialAggregationFailure,
            AppError::Http(e) if e.is_decode() => ErrorKind::UpstreamRejected,
            AppError::Http(_) => ErrorKind::UpstreamUnavailable,
            AppError::Io(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::MissingCode
            | ErrorKind::MissingToken
            | ErrorKind::InvalidState
            | ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::UpstreamAuth => StatusCode::UNAUTHORIZED,
            ErrorKind::UpstreamNotFound => StatusCode::NOT_FOUND,
            ErrorKind::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::UpstreamUnavailable | ErrorKind::UpstreamRejected => StatusCode::BAD_GATEWAY,
            ErrorKind::Config
            | ErrorKind::TokenExchange
            | ErrorKind::PartialAggregationFailure
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Rebuild an error from a relay error body.
    ///
    /// `status` is the HTTP status the body arrived with and is only used for
    /// categories that carry one.
    pub fn from_body(body: ErrorBody, status: u16) -> Self {
        let ErrorBody { error, message } = body;
        match error {
            ErrorKind::Config => AppError::Config(message),
            ErrorKind::MissingCode => AppError::MissingCode,
            ErrorKind::MissingToken => AppError::MissingToken,
            ErrorKind::InvalidState => AppError::InvalidState(message),
            ErrorKind::InvalidRequest => AppError::InvalidRequest(message),
            ErrorKind::TokenExchange => AppError::TokenExchange(message),
            ErrorKind::UpstreamAuth => AppError::UpstreamAuth(message),
            ErrorKind::UpstreamRateLimited => AppError::UpstreamRateLimited,
            ErrorKind::UpstreamNotFound => AppError::UpstreamNotFound(message),
            ErrorKind::UpstreamUnavailable => AppError::UpstreamUnavailable(message),
            ErrorKind::UpstreamRejected => AppError::UpstreamRejected { status, message },
            ErrorKind::PartialAggregationFailure | ErrorKind::Internal => {
                AppError::Internal(message)
            }
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        } else {
            tracing::warn!(error = %self, status = %status, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

fn join_resources(resources: &[Resource]) -> String {
    resources
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, AppError>;
