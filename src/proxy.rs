//! Route groups that forward a prefix to an upstream service.

use crate::config::{validate_upstream_url, DEFAULT_FORWARD_BODY_LIMIT};
use crate::error::{AppError, AppResult};
use crate::middleware::{body_read_error, declared_length};
use crate::state::AppState;
use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderName, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use url::Url;

/// Headers that describe a single connection and are never forwarded
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
];

/// An upstream service reachable over HTTP
#[derive(Debug, Clone)]
pub struct Upstream {
    name: &'static str,
    base: Url,
    client: reqwest::Client,
    body_limit: usize,
}

impl Upstream {
    pub fn new(name: &'static str, base_url: &str, client: reqwest::Client) -> AppResult<Self> {
        let base = validate_upstream_url(name, base_url)?;
        Ok(Self {
            name,
            base,
            client,
            body_limit: DEFAULT_FORWARD_BODY_LIMIT,
        })
    }

    /// Refuse request bodies larger than `limit` bytes with 413
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Map the prefix-stripped request URI onto the upstream base URL
    pub fn target_url(&self, uri: &Uri) -> AppResult<Url> {
        let base = self.base.as_str().trim_end_matches('/');
        let path = uri.path();
        let target = match uri.query() {
            Some(query) => format!("{}{}?{}", base, path, query),
            None => format!("{}{}", base, path),
        };

        Url::parse(&target).map_err(|e| {
            AppError::Internal(format!("Invalid upstream URL for {}: {}", self.name, e))
        })
    }

    /// Send the request to the upstream and relay its response as-is.
    ///
    /// The body is buffered up to the configured limit before anything is sent.
    pub async fn forward(&self, req: Request) -> AppResult<Response> {
        if declared_length(req.headers()).is_some_and(|len| len > self.body_limit) {
            return Err(AppError::PayloadTooLarge);
        }

        let (parts, body) = req.into_parts();
        let url = self.target_url(&parts.uri)?;

        let body = axum::body::to_bytes(body, self.body_limit)
            .await
            .map_err(body_read_error)?;

        tracing::debug!(upstream = self.name, method = %parts.method, url = %url, "Forwarding request");

        let upstream_response = self
            .client
            .request(parts.method, url)
            .headers(strip_hop_by_hop(parts.headers))
            .body(body)
            .send()
            .await?;

        let status = upstream_response.status();
        let headers = strip_hop_by_hop(upstream_response.headers().clone());
        let bytes = upstream_response.bytes().await?;

        Ok((status, headers, bytes).into_response())
    }
}

fn strip_hop_by_hop(mut headers: HeaderMap) -> HeaderMap {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    // The body is re-framed on each hop
    headers.remove(header::CONTENT_LENGTH);
    headers
}

/// Route group sending every request under its prefix to `upstream`
pub fn upstream_router(upstream: Upstream) -> Router<Arc<AppState>> {
    let upstream = Arc::new(upstream);
    let handler = any(move |req: Request| {
        let upstream = upstream.clone();
        async move { upstream.forward(req).await }
    });

    Router::new()
        .route("/", handler.clone())
        .route("/{*rest}", handler)
}
