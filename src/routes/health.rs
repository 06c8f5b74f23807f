use crate::routes::types::HealthResponse;
use axum::Json;

/// Health check endpoint
///
/// Always answers 200. Does not touch the database or any route group.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
