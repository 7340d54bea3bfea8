//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string. Without it the service
//!   runs on the in-memory store.
//! - `PORT` - Listen port (default: 8083)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `NATS_URL` - NATS server for domain events. Events are only logged when unset.
//! - `EVENT_SUBJECT_PREFIX` - Subject prefix for published events (default: backoffice)

use std::net::SocketAddr;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8083;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_SUBJECT_PREFIX: &str = "backoffice";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),
}

#[derive(Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub port: u16,
    pub db_max_connections: u32,
    pub nats_url: Option<String>,
    pub event_subject_prefix: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("port", &self.port)
            .field("db_max_connections", &self.db_max_connections)
            .field("nats_url", &self.nats_url)
            .field("event_subject_prefix", &self.event_subject_prefix)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidEnvVar("PORT", format!("{e}")))?,
            None => DEFAULT_PORT,
        };
        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(0) => return Err(ConfigError::InvalidEnvVar("DB_MAX_CONNECTIONS", "must be at least 1".into())),
                Ok(n) => n,
                Err(e) => return Err(ConfigError::InvalidEnvVar("DB_MAX_CONNECTIONS", format!("{e}"))),
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            port,
            db_max_connections,
            nats_url: get("NATS_URL"),
            event_subject_prefix: get("EVENT_SUBJECT_PREFIX").unwrap_or_else(|| DEFAULT_SUBJECT_PREFIX.to_string()),
        })
    }

    pub fn listen_addr(&self) -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], self.port)) }
}
