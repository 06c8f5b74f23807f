//! Cross-origin policy for browser clients.
//!
//! The policy is an ordered list of rules evaluated top to bottom; the first
//! rule that matches allows the request. Requests without an `Origin` header
//! (curl, mobile apps, server-to-server calls) are always allowed.

use crate::error::{AppError, AppResult};
use axum::http::{header, HeaderValue, Method};
use http::request::Parts;
use regex::Regex;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub const NO_ORIGIN_RULE: &str = "no-origin";
pub const LOOPBACK_RULE: &str = "loopback";
pub const VERCEL_RULE: &str = "vercel";
pub const ALLOW_LIST_RULE: &str = "allow-list";

const LOOPBACK_PATTERNS: &[&str] = &[
    r"^http://localhost(:\d+)?$",
    r"^http://127\.0\.0\.1(:\d+)?$",
];
const VERCEL_PATTERNS: &[&str] = &[r"^https://.*\.vercel\.app$"];

/// Methods advertised to browsers on preflight
pub const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
];

#[derive(Debug, Clone)]
enum OriginMatcher {
    Patterns(Vec<Regex>),
    Exact(Vec<String>),
}

/// A named rule of the origin policy
#[derive(Debug, Clone)]
pub struct OriginRule {
    name: &'static str,
    matcher: OriginMatcher,
}

impl OriginRule {
    /// Rule matching any of the given regular expressions
    pub fn patterns(name: &'static str, patterns: &[&str]) -> AppResult<Self> {
        let regexes = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    AppError::Configuration(format!("Invalid origin pattern {}: {}", p, e))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            name,
            matcher: OriginMatcher::Patterns(regexes),
        })
    }

    /// Rule matching one of the given origins exactly
    pub fn exact(name: &'static str, origins: Vec<String>) -> Self {
        Self {
            name,
            matcher: OriginMatcher::Exact(origins),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn matches(&self, origin: &str) -> bool {
        match &self.matcher {
            OriginMatcher::Patterns(regexes) => regexes.iter().any(|r| r.is_match(origin)),
            OriginMatcher::Exact(origins) => origins.iter().any(|o| o == origin),
        }
    }
}

/// Outcome of evaluating an origin against the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginDecision {
    Allowed { rule: &'static str },
    Denied,
}

impl OriginDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, OriginDecision::Allowed { .. })
    }
}

/// Ordered, first-match-wins origin policy
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    rules: Vec<OriginRule>,
}

impl OriginPolicy {
    /// Build the gateway policy: loopback, then Vercel deployments, then the
    /// explicit allow-list
    pub fn new(allowed_origins: &[String]) -> AppResult<Self> {
        Ok(Self::from_rules(vec![
            OriginRule::patterns(LOOPBACK_RULE, LOOPBACK_PATTERNS)?,
            OriginRule::patterns(VERCEL_RULE, VERCEL_PATTERNS)?,
            OriginRule::exact(ALLOW_LIST_RULE, allowed_origins.to_vec()),
        ]))
    }

    pub fn from_rules(rules: Vec<OriginRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[OriginRule] {
        &self.rules
    }

    /// Evaluate an origin. An absent or empty origin is allowed.
    pub fn evaluate(&self, origin: Option<&str>) -> OriginDecision {
        let origin = match origin {
            None | Some("") => return OriginDecision::Allowed { rule: NO_ORIGIN_RULE },
            Some(origin) => origin,
        };

        self.rules
            .iter()
            .find(|rule| rule.matches(origin))
            .map(|rule| OriginDecision::Allowed { rule: rule.name() })
            .unwrap_or(OriginDecision::Denied)
    }

    /// Like [`evaluate`](Self::evaluate), but a denial becomes an error
    pub fn check(&self, origin: Option<&str>) -> AppResult<&'static str> {
        match self.evaluate(origin) {
            OriginDecision::Allowed { rule } => Ok(rule),
            OriginDecision::Denied => Err(AppError::OriginRejected(
                origin.unwrap_or_default().to_string(),
            )),
        }
    }
}

/// CORS header layer sharing the gateway's origin policy
pub fn cors_layer(policy: Arc<OriginPolicy>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin
                    .to_str()
                    .map(|o| policy.evaluate(Some(o)).is_allowed())
                    .unwrap_or(false)
            },
        ))
        .allow_credentials(true)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
