//! Shared fixtures for the HTTP tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::response::Response;
use habit_gateway::config::DatabaseConfig;
use habit_gateway::cors::OriginPolicy;
use habit_gateway::db::Database;
use habit_gateway::state::AppState;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;

pub const DEPLOYED_ORIGIN: &str = "https://habits.example.com";
pub const JSON_BODY_LIMIT: usize = 1024;
pub const FORWARD_BODY_LIMIT: usize = 2048;

/// State with a lazy pool pointing nowhere; no test touches the database.
/// Must be called inside a tokio runtime.
pub fn test_state() -> Arc<AppState> {
    let database = Database::connect_lazy(&DatabaseConfig {
        url: "postgres://localhost:1/habits".to_string(),
        max_connections: 1,
        min_connections: 0,
        acquire_timeout_seconds: 1,
    })
    .unwrap();

    let policy = OriginPolicy::new(&[DEPLOYED_ORIGIN.to_string()]).unwrap();
    Arc::new(AppState::new(policy, JSON_BODY_LIMIT, database))
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
