use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::repository::memory::Latency;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/credprint";
const DEFAULT_ADMIN_EMAIL: &str = "admin@credprint.local";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" => Ok(StorageBackend::Postgres),
            _ => Err("expected 'memory' or 'postgres'".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    /// Directory holding the settings document; `None` keeps settings in memory.
    pub settings_dir: Option<PathBuf>,
    pub mock_latency: Latency,
    pub photo_fetch_timeout: Duration,
    /// Lets photo URLs point at loopback, private and link-local hosts.
    pub photo_allow_private_hosts: bool,
    pub seed_admin_email: String,
    pub allowed_origins: String,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let environment = match var("RUST_ENV") {
            Some(value) if value.eq_ignore_ascii_case("production") => Environment::Production,
            _ => Environment::Development,
        };

        Ok(Self {
            storage: parse(&var, "STORAGE_BACKEND", StorageBackend::Memory)?,
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            database_max_connections: parse(&var, "DATABASE_MAX_CONNECTIONS", 5)?,
            bind_addr: parse(&var, "BIND_ADDR", default_bind_addr())?,
            settings_dir: var("SETTINGS_DIR").map(PathBuf::from),
            mock_latency: Latency {
                read: Duration::from_millis(parse(&var, "MOCK_READ_LATENCY_MS", 0)?),
                write: Duration::from_millis(parse(&var, "MOCK_WRITE_LATENCY_MS", 0)?),
            },
            photo_fetch_timeout: Duration::from_secs(parse(&var, "PHOTO_FETCH_TIMEOUT_SECS", 10)?),
            photo_allow_private_hosts: parse(&var, "PHOTO_ALLOW_PRIVATE_HOSTS", false)?,
            seed_admin_email: var("SEED_ADMIN_EMAIL")
                .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
            allowed_origins: var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
            environment,
        })
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3001))
}

fn parse<T>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match var(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value,
            reason: e.to_string(),
        }),
    }
}
