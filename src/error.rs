use crate::routes::types::ErrorEnvelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

/// Message used when an error carries no text of its own
pub const FALLBACK_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("The CORS policy for this site does not allow access from the specified Origin.")]
    OriginRejected(String),

    #[error("{0}")]
    MalformedBody(String),

    #[error("request entity too large")]
    PayloadTooLarge,

    /// An error raised by a route group together with the status it wants returned
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Environment variable missing: {0}")]
    MissingEnvVar(String),

    #[error("{0}")]
    Panic(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build a handler-declared error that is reported with `status`
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        AppError::Status {
            status,
            message: message.into(),
        }
    }

    /// The status the error asks for, if it declares one
    pub fn declared_status(&self) -> Option<StatusCode> {
        match self {
            AppError::MalformedBody(_) => Some(StatusCode::BAD_REQUEST),
            AppError::PayloadTooLarge => Some(StatusCode::PAYLOAD_TOO_LARGE),
            AppError::Status { status, .. } => Some(*status),
            AppError::Upstream(_) => Some(StatusCode::BAD_GATEWAY),
            _ => None,
        }
    }

    /// Status reported to the client: the declared one, or 500
    pub fn status_code(&self) -> StatusCode {
        self.declared_status()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Build the envelope sent to the client for this error
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(self.to_string(), self.status_code())
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::OriginRejected(origin) => {
                tracing::error!(origin = %origin, status = status.as_u16(), "{}", self);
            }
            _ => tracing::error!(error = ?self, status = status.as_u16(), "{}", self),
        }

        (status, Json(self.envelope())).into_response()
    }
}

/// Result type alias for AppResult
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_status_is_honored() {
        let err = AppError::with_status(StatusCode::NOT_FOUND, "Habit not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let envelope = err.envelope();
        assert_eq!(envelope.error.status, 404);
        assert_eq!(envelope.error.message, "Habit not found");
    }

    #[test]
    fn test_undeclared_status_defaults_to_500() {
        let err = AppError::OriginRejected("https://evil.example".to_string());
        assert!(err.declared_status().is_none());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.envelope().error.message,
            "The CORS policy for this site does not allow access from the specified Origin."
        );
    }

    #[test]
    fn test_empty_message_uses_fallback() {
        let err = AppError::with_status(StatusCode::UNAUTHORIZED, "");
        let envelope = err.envelope();
        assert_eq!(envelope.error.message, FALLBACK_ERROR_MESSAGE);
        assert_eq!(envelope.error.status, 401);
    }

    #[test]
    fn test_body_errors_declare_client_statuses() {
        assert_eq!(
            AppError::MalformedBody("expected value".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::PayloadTooLarge.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response =
            AppError::with_status(StatusCode::BAD_REQUEST, "Title is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
