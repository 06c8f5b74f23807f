use crate::error::FALLBACK_ERROR_MESSAGE;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: "Server is running".to_string(),
        }
    }
}

/// JSON body returned for every failed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// Inner part of the error envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub status: u16,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            FALLBACK_ERROR_MESSAGE.to_string()
        } else {
            message
        };

        Self {
            error: ErrorBody {
                message,
                status: status.as_u16(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_literal_body() {
        let body = serde_json::to_string(&HealthResponse::ok()).unwrap();
        assert_eq!(body, r#"{"status":"ok","message":"Server is running"}"#);
    }

    #[test]
    fn test_error_envelope_shape() {
        let envelope = ErrorEnvelope::new("Habit not found", StatusCode::NOT_FOUND);
        let body = serde_json::to_string(&envelope).unwrap();
        assert_eq!(body, r#"{"error":{"message":"Habit not found","status":404}}"#);
    }
}
