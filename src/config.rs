use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::domain::dispatch::ReturnAccounting;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: BackendConfig,
    pub return_accounting: ReturnAccounting,
}

impl AppConfig {
    /// Reads the process environment; call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get("BACKEND_URL").ok_or(ConfigError::Missing("BACKEND_URL"))?;
        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or("PORT", get("PORT"), 8080u16)?;
        let connect_secs = parse_or(
            "BACKEND_CONNECT_TIMEOUT_SECS",
            get("BACKEND_CONNECT_TIMEOUT_SECS"),
            5u64,
        )?;
        let request_secs = parse_or("BACKEND_TIMEOUT_SECS", get("BACKEND_TIMEOUT_SECS"), 30u64)?;
        let return_accounting = match get("RETURN_ACCOUNTING") {
            Some(raw) => raw.parse::<ReturnAccounting>().map_err(|_| ConfigError::Invalid {
                var: "RETURN_ACCOUNTING",
                value: raw,
            })?,
            None => ReturnAccounting::default(),
        };

        Ok(Self {
            host,
            port,
            backend: BackendConfig {
                base_url,
                token: get("BACKEND_TOKEN"),
                connect_timeout: Duration::from_secs(connect_secs),
                request_timeout: Duration::from_secs(request_secs),
            },
            return_accounting,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}
