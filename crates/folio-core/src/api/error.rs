use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::utils::truncate;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - session missing or expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request rejected ({status}): {message}")]
    Validation { status: StatusCode, message: String },

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// Prefer the `message` field of a JSON error body, else the raw body
    fn describe_body(body: &str) -> String {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| body.to_string());
        truncate(&message, MAX_ERROR_BODY_LENGTH)
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let described = Self::describe_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(described),
            404 => ApiError::NotFound(described),
            400..=499 => ApiError::Validation {
                status,
                message: described,
            },
            500..=599 => ApiError::ServerError(described),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, described)),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthorized => ErrorKind::AuthFailed,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::AccessDenied(_)
            | ApiError::Validation { .. }
            | ApiError::InvalidRequest(_) => ErrorKind::ValidationFailed,
            ApiError::ServerError(_) | ApiError::NetworkError(_) | ApiError::InvalidResponse(_) => {
                ErrorKind::NetworkError
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::NetworkError(err.to_string())
    }
}

/// The closed set of failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AuthFailed,
    NetworkError,
    ValidationFailed,
    NotFound,
}

impl ErrorKind {
    fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::AuthFailed => "Authentication failed",
            ErrorKind::NetworkError => "Unable to reach the server",
            ErrorKind::ValidationFailed => "The request was rejected",
            ErrorKind::NotFound => "Not found",
        }
    }
}

/// A failed store operation: a kind to branch on plus an optional message
/// meant for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    pub kind: ErrorKind,
    pub message: Option<String>,
}

impl OperationError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailed).with_message(message)
    }

    /// Map an API failure to its kind, with a fixed display message
    pub fn from_api(err: &ApiError, message: &str) -> Self {
        Self::new(err.kind()).with_message(message)
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message {
            Some(ref message) => f.write_str(message),
            None => f.write_str(self.kind.default_message()),
        }
    }
}

impl std::error::Error for OperationError {}
