//! Environment-driven service configuration.

use std::env;
use std::net::{AddrParseError, SocketAddr};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid bind address {value}: {source}")]
    InvalidBindAddr {
        value: String,
        source: AddrParseError,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service_name: String,
    pub bind_addr: SocketAddr,
    /// Shared secret every in-cluster caller must present.
    pub cluster_token: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let service_name =
            env::var("ENGINE_SERVICE_NAME").unwrap_or_else(|_| "engine".to_string());
        let bind_value = env::var("ENGINE_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".to_string());
        let bind_addr = bind_value
            .parse()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: bind_value,
                source,
            })?;
        let cluster_token = env::var("CLUSTER_ACCESS_TOKEN")
            .map_err(|_| ConfigError::MissingVar("CLUSTER_ACCESS_TOKEN"))?;

        Ok(Self {
            service_name,
            bind_addr,
            cluster_token,
        })
    }

    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            service_name: "engine".to_string(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            cluster_token: "test-cluster-token".to_string(),
        }
    }
}
