use std::time::Duration;

use alchemy_schema::SchemaLevel;
use serde::{Deserialize, Serialize};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 10;

/// Console settings. Read from `ALCHEMY_CONSOLE_CONFIG` (a JSON file with
/// these keys) when set, otherwise from individual environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// GraphQL endpoint of the backend that owns collections.
    pub graphql_url: String,
    #[serde(default = "default_submit_timeout_secs")]
    pub submit_timeout_secs: u64,
    #[serde(default)]
    pub collection_level: SchemaLevel,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_submit_timeout_secs() -> u64 {
    DEFAULT_SUBMIT_TIMEOUT_SECS
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("failed to read config from {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config from {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source shaped like the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(path) = lookup("ALCHEMY_CONSOLE_CONFIG") {
            return Self::from_file(&path);
        }

        let graphql_url = lookup("ALCHEMY_GRAPHQL_URL")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("ALCHEMY_GRAPHQL_URL"))?;

        let port = match lookup("PORT") {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value: v })?,
            None => DEFAULT_PORT,
        };

        let submit_timeout_secs = match lookup("ALCHEMY_SUBMIT_TIMEOUT_SECS") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "ALCHEMY_SUBMIT_TIMEOUT_SECS",
                value: v,
            })?,
            None => DEFAULT_SUBMIT_TIMEOUT_SECS,
        };

        let collection_level = match lookup("ALCHEMY_COLLECTION_LEVEL") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "ALCHEMY_COLLECTION_LEVEL",
                value: v,
            })?,
            None => SchemaLevel::default(),
        };

        Ok(Self {
            port,
            graphql_url,
            submit_timeout_secs,
            collection_level,
        })
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
