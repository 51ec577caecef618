use std::net::SocketAddr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Name of this instance.
    pub name: String,

    /// The path to the config file (without extension).
    pub config_file: String,

    /// The logging config.
    pub logging: LoggingConfig,

    /// API config.
    pub api: ApiConfig,

    /// Database config.
    pub database: DatabaseConfig,

    /// Redis config.
    pub redis: RedisConfig,

    /// JWT config.
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// The log level to use, this is a tracing env filter.
    pub level: String,

    /// Emit logs as json instead of the pretty format.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address for the API server.
    pub bind_address: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "[::]:8080".parse().expect("failed to parse bind address"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// The database URL to use.
    pub uri: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: "postgres://root@localhost:5432/ledgerstream_dev".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RedisConfig {
    /// The redis URL to use. When empty the process falls back to the
    /// in-process store, which only makes sense for a single instance.
    pub uri: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self { uri: String::new() }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct JwtConfig {
    /// JWT signing secret.
    pub secret: String,

    /// JWT issuer.
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "ledgerstream".to_string(),
            issuer: "ledgerstream".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "ledgerstream-api".to_string(),
            config_file: "config".to_string(),
            logging: LoggingConfig::default(),
            api: ApiConfig::default(),
            database: DatabaseConfig::default(),
            redis: RedisConfig::default(),
            jwt: JwtConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load the config from the config file (if present) with
    /// `LEDGERSTREAM_`-prefixed environment variables layered on top.
    pub fn parse() -> Result<Self> {
        let file = std::env::var("LEDGERSTREAM_CONFIG_FILE")
            .unwrap_or_else(|_| AppConfig::default().config_file);

        let config = ::config::Config::builder()
            .add_source(::config::File::with_name(&file).required(false))
            .add_source(
                ::config::Environment::with_prefix("LEDGERSTREAM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<AppConfig>()?;

        Ok(config)
    }
}
