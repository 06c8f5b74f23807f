use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::env;

/// Deployment origins allowed when `ALLOWED_ORIGINS` is not set
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] =
    &["https://habit-tracker-ois91z4n8-kailashs-projects-8c368369.vercel.app"];

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed by exact match, on top of the built-in loopback and
    /// Vercel rules
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl CorsConfig {
    pub fn from_env() -> AppResult<Self> {
        let config = match env::var("ALLOWED_ORIGINS") {
            Ok(raw) => Self {
                allowed_origins: parse_origin_list(&raw),
            },
            Err(_) => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        for origin in &self.allowed_origins {
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                return Err(AppError::Configuration(format!(
                    "Allowed origin must start with http:// or https://: {}",
                    origin
                )));
            }

            // Browsers never send a trailing slash, so such an entry could never match
            if origin.ends_with('/') {
                return Err(AppError::Configuration(format!(
                    "Allowed origin must not end with '/': {}",
                    origin
                )));
            }
        }

        Ok(())
    }
}

/// Split a comma separated origin list, dropping blank entries
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
