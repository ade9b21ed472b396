//! Error types for world-priority.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Priority not found: {0}")]
    PriorityNotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Identity is not on the admin allow-list.
    #[error("Access denied: {0}")]
    AuthDenied(String),

    /// The (user, priority) pair already has a vote.
    #[error("Already voted for priority {0}")]
    AlreadyVoted(String),

    /// The moderation action is not allowed from the current status.
    #[error("Cannot {action} a priority that is {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Required submission fields missing or malformed.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    // === Server Errors ===
    /// Any transport, query or write failure from the store.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) | Self::PriorityNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::AuthDenied(_) => StatusCode::FORBIDDEN,
            Self::AlreadyVoted(_) | Self::InvalidTransition { .. } | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,

            // 5xx Server Errors
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::PriorityNotFound(_) => "PRIORITY_NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::AuthDenied(_) => "AUTH_DENIED",
            Self::AlreadyVoted(_) => "ALREADY_VOTED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Conflict(_) => "CONFLICT",
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationFailed(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
