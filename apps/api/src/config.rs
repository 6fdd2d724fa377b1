//! API configuration module.
//!
//! Layered with the `config` crate, later sources winning:
//!
//! ```text
//! ApiConfig::default()  ──►  meridian.toml (optional)  ──►  MERIDIAN_* env
//! ```
//!
//! e.g. `MERIDIAN_PORT=9000 MERIDIAN_JWT_SECRET=... meridian-api`

use std::net::SocketAddr;
use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Minimum JWT secret length accepted in release builds.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Secret key for signing tokens (HS256)
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub access_token_ttl_secs: i64,

    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_secs: i64,

    /// Refuse payments that would take stock below zero
    pub enforce_stock_floor: bool,

    /// Allow any origin (development storefronts)
    pub cors_allow_any: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: PathBuf::from("./meridian.db"),
            max_connections: 5,
            // In production, this MUST be set via MERIDIAN_JWT_SECRET
            jwt_secret: "meridian-dev-secret-change-in-production".to_string(),
            access_token_ttl_secs: 3600,     // 1 hour
            refresh_token_ttl_secs: 604_800, // 7 days
            enforce_stock_floor: true,
            cors_allow_any: false,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `meridian.toml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("meridian")
    }

    /// Same as [`load`](Self::load) with an explicit file stem or path.
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let config: ApiConfig = Config::builder()
            .add_source(Config::try_from(&ApiConfig::default())?)
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix("MERIDIAN").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        if self.access_token_ttl_secs <= 0 || self.refresh_token_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue("token ttl".to_string()));
        }
        if !cfg!(debug_assertions) && self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::WeakSecret(MIN_JWT_SECRET_LEN));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("host".to_string()))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("jwt_secret must be at least {0} characters")]
    WeakSecret(usize),
}
