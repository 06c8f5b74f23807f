use super::parse_var;
use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::env;

/// Largest JSON body accepted when `JSON_BODY_LIMIT` is not set (100 KiB)
pub const DEFAULT_JSON_BODY_LIMIT: usize = 100 * 1024;

/// Largest body forwarded to an upstream when `FORWARD_BODY_LIMIT` is not set (10 MiB)
pub const DEFAULT_FORWARD_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to bind to (e.g., 5000)
    pub port: u16,

    /// Maximum size of a JSON request body in bytes
    pub json_body_limit: usize,

    /// Maximum size of a request body forwarded to an upstream service
    pub forward_body_limit: usize,
}

impl ServerConfig {
    pub fn from_env() -> AppResult<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("PORT", "5000")?;
        let json_body_limit = parse_var("JSON_BODY_LIMIT", &DEFAULT_JSON_BODY_LIMIT.to_string())?;
        let forward_body_limit = parse_var(
            "FORWARD_BODY_LIMIT",
            &DEFAULT_FORWARD_BODY_LIMIT.to_string(),
        )?;

        Ok(Self {
            host,
            port,
            json_body_limit,
            forward_body_limit,
        })
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.host.trim().is_empty() {
            return Err(AppError::Configuration("HOST cannot be empty".to_string()));
        }

        if self.json_body_limit == 0 {
            return Err(AppError::Configuration(
                "JSON_BODY_LIMIT must be greater than 0".to_string(),
            ));
        }

        if self.forward_body_limit == 0 {
            return Err(AppError::Configuration(
                "FORWARD_BODY_LIMIT must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address string the listener binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
