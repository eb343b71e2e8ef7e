//! Configuration management for FixMate
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Secret used when `JWT_SECRET` is unset; refused in production
pub const DEV_JWT_SECRET: &str = "development-secret-change-in-production";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Where bookings and technicians are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl StorageBackend {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid storage backend: '{}'. Expected: postgres or memory",
                s
            ))),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Server port
    pub port: u16,

    pub storage_backend: StorageBackend,

    /// Database connection URL; required for the postgres backend
    pub database_url: Option<String>,

    /// Maximum database connections
    pub db_max_connections: u32,

    /// CORS allowed origins, comma separated
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// JWT secret for token verification
    pub jwt_secret: String,

    /// Lifetime of tokens minted by the dev helpers
    pub jwt_token_ttl_seconds: i64,

    /// Cost estimator API key; without it every first quote falls back to the range minimum
    pub estimator_api_key: Option<String>,

    pub estimator_base_url: String,

    pub estimator_model: String,

    pub estimator_timeout: Duration,

    pub auto_responder_enabled: bool,

    /// Seed demo technicians for the Bihar districts at startup
    pub seed_demo_data: bool,
}

fn parse_bool(key: &str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" || v.eq_ignore_ascii_case("yes") => {
            Ok(true)
        }
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" || v.eq_ignore_ascii_case("no") => {
            Ok(false)
        }
        Some(v) => Err(ConfigError::InvalidValue(format!(
            "{} must be true or false, got '{}'",
            key, v
        ))),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let storage_backend = lookup("STORAGE_BACKEND")
            .map(|s| StorageBackend::parse(&s))
            .unwrap_or(Ok(StorageBackend::Postgres))?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
        }

        let db_max_connections = lookup("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS");

        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());
        if environment.is_production() && jwt_secret == DEV_JWT_SECRET {
            return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()));
        }

        let jwt_token_ttl_seconds = lookup("JWT_TOKEN_TTL_SECONDS")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(86_400);

        let estimator_api_key = lookup("ESTIMATOR_API_KEY").filter(|key| !key.is_empty());

        let estimator_base_url = lookup("ESTIMATOR_BASE_URL")
            .unwrap_or_else(|| crate::estimator::DEFAULT_BASE_URL.to_string());

        let estimator_model = lookup("ESTIMATOR_MODEL")
            .unwrap_or_else(|| crate::estimator::DEFAULT_MODEL.to_string());

        let estimator_timeout = lookup("ESTIMATOR_TIMEOUT_SECS")
            .map(|v| {
                v.parse::<u64>().map_err(|_| {
                    ConfigError::InvalidValue(format!(
                        "ESTIMATOR_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                        v
                    ))
                })
            })
            .unwrap_or(Ok(10))
            .map(Duration::from_secs)?;

        let auto_responder_enabled =
            parse_bool("AUTO_RESPONDER_ENABLED", lookup("AUTO_RESPONDER_ENABLED"), true)?;

        let seed_demo_data = parse_bool("SEED_DEMO_DATA", lookup("SEED_DEMO_DATA"), false)?;

        Ok(Config {
            environment,
            port,
            storage_backend,
            database_url,
            db_max_connections,
            cors_allowed_origins,
            log_level,
            jwt_secret,
            jwt_token_ttl_seconds,
            estimator_api_key,
            estimator_base_url,
            estimator_model,
            estimator_timeout,
            auto_responder_enabled,
            seed_demo_data,
        })
    }

    /// Database URL with the password masked, for logging
    pub fn database_url_masked(&self) -> String {
        let Some(url) = &self.database_url else {
            return "<unset>".to_string();
        };
        if let Some(at_pos) = url.find('@') {
            if let Some(colon_pos) = url[..at_pos].rfind(':') {
                let prefix = &url[..colon_pos + 1];
                let suffix = &url[at_pos..];
                return format!("{}****{}", prefix, suffix);
            }
        }
        url.clone()
    }
}
