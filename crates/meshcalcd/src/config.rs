//! Environment configuration, read once at startup.
//!
//! Malformed values abort startup before any subsystem is initialized;
//! there is never a partially-started registry.

use thiserror::Error;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while reading the process environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var} value: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Broker endpoint settings.
///
/// The standalone daemon carries its broker in-process; the endpoint is
/// still read and logged so deployments pointing at an external broker
/// fail fast on malformed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

/// Process configuration assembled from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub broker: BrokerConfig,
    /// Base identity for the workers hosted by this process.
    pub host_id: String,
}

const BROKER_HOST: &str = "MESHCALC_BROKER_HOST";
const BROKER_PORT: &str = "MESHCALC_BROKER_PORT";
const BROKER_PASSWORD: &str = "MESHCALC_BROKER_PASSWORD";
const HOST_ID: &str = "MESHCALC_HOST_ID";

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through a lookup function, for tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let host = lookup(BROKER_HOST).unwrap_or_else(|| "localhost".to_string());

        let port_raw = lookup(BROKER_PORT).unwrap_or_else(|| "6379".to_string());
        let port = port_raw.parse().map_err(|_| ConfigError::InvalidValue {
            var: BROKER_PORT,
            value: port_raw,
        })?;

        let password = lookup(BROKER_PASSWORD).filter(|p| !p.is_empty());

        let host_id = match lookup(HOST_ID).filter(|h| !h.is_empty()) {
            Some(id) => id,
            None => lookup("HOSTNAME").filter(|h| !h.is_empty()).unwrap_or_else(|| "local".to_string()),
        };

        Ok(Self {
            broker: BrokerConfig {
                host,
                port,
                password,
            },
            host_id,
        })
    }
}
