use crate::error::{AppError, AppResult};
use std::env;
use std::str::FromStr;

mod cors;
mod database;
mod server;
mod upstream;

pub use cors::{parse_origin_list, CorsConfig, DEFAULT_ALLOWED_ORIGINS};
pub use database::DatabaseConfig;
pub use server::{ServerConfig, DEFAULT_FORWARD_BODY_LIMIT, DEFAULT_JSON_BODY_LIMIT};
pub use upstream::{validate_upstream_url, UpstreamConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub upstreams: UpstreamConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        load_dotenv();

        let config = Config {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            cors: CorsConfig::from_env()?,
            upstreams: UpstreamConfig::from_env()?,
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> AppResult<()> {
        self.server.validate()?;
        self.database.validate()?;
        self.cors.validate()?;
        self.upstreams.validate()?;
        Ok(())
    }
}

/// Load a `.env` file if one exists; a missing file is not an error
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Read `name` from the environment, falling back to `default`, and parse it
pub(crate) fn parse_var<T: FromStr>(name: &str, default: &str) -> AppResult<T> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::Configuration(format!("Invalid {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                json_body_limit: DEFAULT_JSON_BODY_LIMIT,
                forward_body_limit: DEFAULT_FORWARD_BODY_LIMIT,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/habits".to_string(),
                max_connections: 10,
                min_connections: 0,
                acquire_timeout_seconds: 30,
            },
            cors: CorsConfig::default(),
            upstreams: UpstreamConfig {
                habits_url: "http://127.0.0.1:5001".to_string(),
                auth_url: "http://127.0.0.1:5002".to_string(),
                stats_url: "http://127.0.0.1:5003".to_string(),
            },
        }
    }

    #[test]
    fn test_config_creation() {
        let config = test_config();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.bind_addr(), "127.0.0.1:5000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_min_connections_above_max() {
        let mut config = test_config();
        config.database.min_connections = 20;
        assert!(matches!(config.validate(), Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_validate_zero_body_limit() {
        let mut config = test_config();
        config.server.json_body_limit = 0;
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.server.forward_body_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_upstream() {
        let mut config = test_config();
        config.upstreams.stats_url = "stats-service".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_var_default_and_invalid() {
        let port: u16 = parse_var("HABIT_GATEWAY_TEST_UNSET_PORT", "5000").unwrap();
        assert_eq!(port, 5000);

        let bad: AppResult<u16> = parse_var("HABIT_GATEWAY_TEST_UNSET_PORT", "not-a-port");
        assert!(bad.is_err());
    }
}
