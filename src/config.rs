//! Process configuration
//!
//! Loaded from an optional JSON file, then overridden from the environment:
//!
//! | Variable           | Field             |
//! |--------------------|-------------------|
//! | `SCHEMAS`          | `schema_dir`      |
//! | `COLLECTION`       | `collection`      |
//! | `BASE_URI`         | `base_uri`        |
//! | `LD_CONTEXT`       | `ld_context`      |
//! | `PLACEHOLDER_MODE` | `placeholder`     |
//! | `DEFAULT_LIMIT`    | `default_limit`   |
//! | `MAX_LIMIT`        | `max_limit`       |
//! | `HOST` / `PORT`    | `host` / `port`   |
//! | `CORS_ORIGINS`     | `cors_origins`    |
//! | `ADMIN_API_KEY`    | `admin_api_key`   |
//! | `LOG_FORMAT`       | `log_format`      |

use std::collections::HashMap;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{Limits, DEFAULT_LIMIT, MAX_LIMIT};
use crate::observability::LogFormat;
use crate::rest_api::{ApiKeyPolicy, Role};
use crate::schema::{LoaderConfig, PlaceholderMode, DEFAULT_COLLECTION};
use crate::serialize::{Serializer, DEFAULT_CONTEXT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Invalid config JSON in '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory of schema documents (default: "./schemas")
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,

    /// Storage collection shared by all types (default: "entities")
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Base URI for `@id`/`@type` values
    #[serde(default)]
    pub base_uri: Option<String>,

    /// `@context` of linked-data output (default: "http://schema.org/")
    #[serde(default = "default_ld_context")]
    pub ld_context: String,

    /// Shape substituted for cyclic references (default: object)
    #[serde(default)]
    pub placeholder: PlaceholderMode,

    /// Search results when no limit is given (default: 100)
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Hard cap on search results (default: 1000)
    #[serde(default = "max_limit")]
    pub max_limit: usize,

    /// Listener address (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Listener port (default: 3000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS; empty allows any
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Key granting write access
    #[serde(default)]
    pub admin_api_key: Option<String>,

    /// Additional API keys and their roles
    #[serde(default)]
    pub api_keys: HashMap<String, Role>,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("./schemas")
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_ld_context() -> String {
    DEFAULT_CONTEXT.to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn max_limit() -> usize {
    MAX_LIMIT
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_dir: default_schema_dir(),
            collection: default_collection(),
            base_uri: None,
            ld_context: default_ld_context(),
            placeholder: PlaceholderMode::default(),
            default_limit: default_limit(),
            max_limit: max_limit(),
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            admin_api_key: None,
            api_keys: HashMap::new(),
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// File (if given), then process environment, then validation.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SCHEMAS") {
            self.schema_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("COLLECTION") {
            self.collection = value;
        }
        if let Some(value) = lookup("BASE_URI") {
            self.base_uri = Some(value).filter(|v| !v.is_empty());
        }
        if let Some(value) = lookup("LD_CONTEXT") {
            self.ld_context = value;
        }
        if let Some(value) = lookup("PLACEHOLDER_MODE") {
            self.placeholder = parse_var("PLACEHOLDER_MODE", &value)?;
        }
        if let Some(value) = lookup("DEFAULT_LIMIT") {
            self.default_limit = parse_var("DEFAULT_LIMIT", &value)?;
        }
        if let Some(value) = lookup("MAX_LIMIT") {
            self.max_limit = parse_var("MAX_LIMIT", &value)?;
        }
        if let Some(value) = lookup("HOST") {
            self.host = value;
        }
        if let Some(value) = lookup("PORT") {
            self.port = parse_var("PORT", &value)?;
        }
        if let Some(value) = lookup("CORS_ORIGINS") {
            self.cors_origins = value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(value) = lookup("ADMIN_API_KEY") {
            self.admin_api_key = Some(value).filter(|v| !v.is_empty());
        }
        if let Some(value) = lookup("LOG_FORMAT") {
            self.log_format = parse_var("LOG_FORMAT", &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_limit == 0 {
            return Err(ConfigError::Invalid("default_limit must be > 0".into()));
        }
        if self.max_limit < self.default_limit {
            return Err(ConfigError::Invalid(format!(
                "max_limit ({}) must be >= default_limit ({})",
                self.max_limit, self.default_limit
            )));
        }
        if self.collection.trim().is_empty() {
            return Err(ConfigError::Invalid("collection must not be empty".into()));
        }
        self.listen_addr()?;
        Ok(())
    }

    /// `host:port` as a bindable address; the host must be an IP literal.
    pub fn listen_addr(&self) -> ConfigResult<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidValue {
            key: "host".to_string(),
            value: addr.clone(),
        })
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig::new(&self.schema_dir)
            .with_collection(&self.collection)
            .with_placeholder(self.placeholder)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
        }
    }

    pub fn serializer(&self) -> Serializer {
        Serializer::new(self.base_uri.clone()).with_context(&self.ld_context)
    }

    pub fn access_policy(&self) -> ApiKeyPolicy {
        ApiKeyPolicy::new(self.admin_api_key.clone()).with_keys(self.api_keys.clone())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
