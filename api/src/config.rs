//! API Configuration

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Listening port
    pub port: u16,
    /// MongoDB configuration
    pub database: DatabaseConfig,
    /// Cross-origin policy
    pub cors: CorsConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            database: DatabaseConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub uri: String,
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".into(),
            name: "ShavasaTicketing".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// The single origin allowed to call the API
    pub allowed_origin: String,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "http://localhost:3000".into(),
            allow_credentials: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid PORT: {0:?}")]
    InvalidPort(String),

    #[error("invalid CORS origin: {0:?}")]
    InvalidOrigin(String),
}

impl ApiConfig {
    /// Load from a JSON file
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load from `CONFIG_PATH` if set, then apply the `PORT` override
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = match std::env::var("CONFIG_PATH") {
            Ok(path) => Self::load(&path).unwrap_or_else(|e| {
                tracing::warn!(%path, error = %e, "Config not loaded, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        };

        config.with_port(std::env::var("PORT").ok().as_deref())
    }

    /// Override the port. Unset or empty leaves it unchanged.
    pub fn with_port(mut self, port: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(port) = port.map(str::trim).filter(|port| !port.is_empty()) {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.to_string()))?;
        }
        Ok(self)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}
