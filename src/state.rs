use crate::cors::OriginPolicy;
use crate::db::Database;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Built once at startup and shared behind `Arc`; nothing in it changes
/// while the server runs.
#[derive(Clone)]
pub struct AppState {
    /// Origin policy used by both the origin guard and the CORS header layer
    pub origin_policy: Arc<OriginPolicy>,

    /// Maximum accepted JSON body size in bytes
    pub json_body_limit: usize,

    /// Database pool made available to the route groups
    pub database: Database,
}

impl AppState {
    pub fn new(origin_policy: OriginPolicy, json_body_limit: usize, database: Database) -> Self {
        Self {
            origin_policy: Arc::new(origin_policy),
            json_body_limit,
            database,
        }
    }
}
