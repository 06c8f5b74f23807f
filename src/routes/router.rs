use crate::config::UpstreamConfig;
use crate::cors::cors_layer;
use crate::error::{AppError, AppResult};
use crate::middleware::{
    canonicalize_mount_case, enforce_origin_policy, handle_panic, parse_cookies,
    parse_json_body, request_id_middleware,
};
use crate::proxy::{upstream_router, Upstream};
use axum::middleware;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::normalize_path::NormalizePathLayer;

use super::health;
use super::AppState;

pub const HEALTH_PATH: &str = "/api/health";
pub const HABITS_PREFIX: &str = "/api/habits";
pub const AUTH_PREFIX: &str = "/api/auth";
pub const STATS_PREFIX: &str = "/api/stats";

/// Every path mounted directly on the gateway router
pub const MOUNT_PATHS: [&str; 4] = [HEALTH_PATH, HABITS_PREFIX, AUTH_PREFIX, STATS_PREFIX];

/// The three route groups mounted under the API prefixes.
///
/// Each group sees paths with its prefix stripped and owns every response
/// under it.
pub struct RouteGroups {
    pub habits: Router<Arc<AppState>>,
    pub auth: Router<Arc<AppState>>,
    pub stats: Router<Arc<AppState>>,
}

impl RouteGroups {
    /// Route groups that forward to the configured upstream services.
    ///
    /// Request bodies larger than `body_limit` bytes are refused with 413.
    pub fn upstreams(config: &UpstreamConfig, body_limit: usize) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let group = |name: &'static str, url: &str, client: reqwest::Client| {
            Upstream::new(name, url, client)
                .map(|upstream| upstream_router(upstream.with_body_limit(body_limit)))
        };

        Ok(Self {
            habits: group("habits", &config.habits_url, client.clone())?,
            auth: group("auth", &config.auth_url, client.clone())?,
            stats: group("stats", &config.stats_url, client)?,
        })
    }
}

/// Create application router
///
/// Before routing, trailing slashes are trimmed and the mount prefixes are
/// matched case-insensitively, so `/API/Habits/` reaches the habits group root.
///
/// Middleware then runs in this order for every request, including unmatched
/// paths: request id, origin guard, CORS headers, panic capture, JSON body,
/// cookies. Errors from any stage become an error envelope; envelopes raised
/// after the origin guard carry the CORS headers.
pub fn create_router(state: Arc<AppState>, groups: RouteGroups) -> Router {
    let pipeline = ServiceBuilder::new()
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_origin_policy,
        ))
        .layer(cors_layer(state.origin_policy.clone()))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(state.clone(), parse_json_body))
        .layer(middleware::from_fn(parse_cookies));

    let routes = Router::new()
        .route(HEALTH_PATH, get(health::health_check))
        .nest(HABITS_PREFIX, groups.habits)
        .nest(AUTH_PREFIX, groups.auth)
        .nest(STATS_PREFIX, groups.stats)
        .layer(pipeline)
        .with_state(state);

    // Router::layer runs after routing, so path rewrites wrap the whole router
    let normalized = ServiceBuilder::new()
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(middleware::map_request(canonicalize_mount_case))
        .service(routes);

    Router::new().fallback_service(normalized)
}
