//! Request pipeline stages.
//!
//! Each stage is an axum `from_fn` middleware. They are composed in a fixed
//! order by [`crate::routes::create_router`].

use crate::error::{AppError, AppResult};
use crate::routes::MOUNT_PATHS;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        header,
        uri::{PathAndQuery, Uri},
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use http_body_util::LengthLimitError;
use serde_json::{Map, Value};
use std::any::Any;
use std::sync::Arc;
use uuid::Uuid;

/// Request ID wrapper for use in request extensions
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// Parsed JSON request body, available to handlers through `Extension<JsonBody>`
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Value);

/// Rewrite `path` so a mount prefix written in another case matches the
/// gateway's lowercase mount. Returns `None` when nothing changes.
pub fn canonical_mount_path(path: &str) -> Option<String> {
    MOUNT_PATHS.iter().find_map(|mount| {
        let head = path.get(..mount.len())?;
        let rest = &path[mount.len()..];

        if head != *mount
            && head.eq_ignore_ascii_case(mount)
            && (rest.is_empty() || rest.starts_with('/'))
        {
            Some(format!("{}{}", mount, rest))
        } else {
            None
        }
    })
}

/// Mount prefix case middleware - runs before routing
pub async fn canonicalize_mount_case(mut req: Request) -> Request {
    let Some(path) = canonical_mount_path(req.uri().path()) else {
        return req;
    };

    let path_and_query = match req.uri().query() {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    };

    let mut parts = req.uri().clone().into_parts();
    if let Ok(path_and_query) = PathAndQuery::try_from(path_and_query) {
        parts.path_and_query = Some(path_and_query);
        if let Ok(uri) = Uri::from_parts(parts) {
            *req.uri_mut() = uri;
        }
    }

    req
}

/// Request ID middleware - adds a unique ID to each request
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    // Try to get existing request ID from header, or generate new one
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| RequestId(s.to_string()))
        .unwrap_or_default();

    req.extensions_mut().insert(request_id.clone());

    tracing::info!(
        request_id = %request_id.as_str(),
        method = %req.method(),
        path = %req.uri().path(),
        "Incoming request"
    );

    let mut response = next.run(req).await;

    if let Ok(header_value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert("x-request-id", header_value);
    }

    response
}

/// Reject requests whose `Origin` the policy does not allow
pub async fn enforce_origin_policy(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> AppResult<Response> {
    {
        let origin = match req.headers().get(header::ORIGIN) {
            None => None,
            Some(value) => Some(value.to_str().map_err(|_| {
                AppError::OriginRejected(String::from_utf8_lossy(value.as_bytes()).into_owned())
            })?),
        };

        let rule = state.origin_policy.check(origin)?;
        tracing::debug!(origin = origin.unwrap_or("-"), rule, "Origin allowed");
    }

    Ok(next.run(req).await)
}

/// Whether the request declares a JSON body
pub fn is_json_request(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

/// Parse a JSON request body in strict mode: an empty body reads as `{}`,
/// anything other than an object or array at the top level is refused.
pub fn parse_json(bytes: &[u8]) -> AppResult<Value> {
    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        None => Ok(Value::Object(Map::new())),
        Some(b'{') | Some(b'[') => {
            serde_json::from_slice(bytes).map_err(|e| AppError::MalformedBody(e.to_string()))
        }
        Some(_) => Err(AppError::MalformedBody(
            "JSON body must be an object or an array".to_string(),
        )),
    }
}

pub(crate) fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

pub(crate) fn body_read_error(err: axum::Error) -> AppError {
    let inner = err.into_inner();
    if inner.is::<LengthLimitError>() {
        AppError::PayloadTooLarge
    } else {
        AppError::MalformedBody(format!("Failed to read request body: {}", inner))
    }
}

/// JSON body middleware - parses JSON requests and keeps the raw bytes for
/// downstream handlers
pub async fn parse_json_body(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> AppResult<Response> {
    if !is_json_request(req.headers()) {
        return Ok(next.run(req).await);
    }

    if declared_length(req.headers()).is_some_and(|len| len > state.json_body_limit) {
        return Err(AppError::PayloadTooLarge);
    }

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, state.json_body_limit)
        .await
        .map_err(body_read_error)?;

    let value = parse_json(&bytes)?;

    let mut req = Request::from_parts(parts, Body::from(bytes));
    req.extensions_mut().insert(JsonBody(value));

    Ok(next.run(req).await)
}

/// Cookie middleware - exposes the request cookies as a `CookieJar` extension
pub async fn parse_cookies(mut req: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    req.extensions_mut().insert(jar);

    next.run(req).await
}

/// Turn a panic inside a handler into an error envelope
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        String::new()
    };

    AppError::Panic(message).into_response()
}
