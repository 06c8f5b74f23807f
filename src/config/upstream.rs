use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::env;
use url::Url;

/// Base URLs of the services behind each route prefix
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Service handling `/api/habits`
    pub habits_url: String,

    /// Service handling `/api/auth`
    pub auth_url: String,

    /// Service handling `/api/stats`
    pub stats_url: String,
}

impl UpstreamConfig {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            habits_url: required("HABITS_SERVICE_URL")?,
            auth_url: required("AUTH_SERVICE_URL")?,
            stats_url: required("STATS_SERVICE_URL")?,
        })
    }

    pub fn validate(&self) -> AppResult<()> {
        validate_upstream_url("HABITS_SERVICE_URL", &self.habits_url)?;
        validate_upstream_url("AUTH_SERVICE_URL", &self.auth_url)?;
        validate_upstream_url("STATS_SERVICE_URL", &self.stats_url)?;
        Ok(())
    }
}

fn required(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::MissingEnvVar(name.to_string()))
}

/// Parse an upstream base URL, accepting only http and https
pub fn validate_upstream_url(name: &str, raw: &str) -> AppResult<Url> {
    let url = Url::parse(raw)
        .map_err(|e| AppError::Configuration(format!("Invalid {}: {}", name, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::Configuration(format!(
            "{} must use http or https, got {}",
            name, other
        ))),
    }
}
