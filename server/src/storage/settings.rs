//! Settings management
//!
//! Settings come from an optional JSON file, then environment variables
//! override individual fields.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use crate::app::options::{AppOptions, ServerOptions, StorageOptions};
use crate::errors::ServiceError;
use crate::logs::{LogLevel, LogOptions};
use crate::storage::layout::StorageLayout;

/// Server settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,

    /// Directory for daily-rotated log files
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// HTTP listener configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Database and upload locations
    #[serde(default)]
    pub storage: StorageSettings,

    /// Base URL used in artifact links instead of the request origin
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// Shared secret for management routes
    #[serde(default)]
    pub secret: Option<SecretString>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_dir: None,
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
            public_base_url: None,
            secret: None,
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_upload_mb() -> usize {
    256
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("app.db")
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            uploads_dir: default_uploads_dir(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ServiceError> {
    value
        .parse()
        .map_err(|_| ServiceError::ConfigError(format!("Invalid value for {name}: {value:?}")))
}

impl Settings {
    /// Read settings from a JSON file, or defaults when no file is given
    pub async fn load(path: Option<&Path>) -> Result<Self, ServiceError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            ServiceError::ConfigError(format!("Unable to read {}: {}", path.display(), e))
        })?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ServiceError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if let Some(value) = get("APP_HOST") {
            self.server.host = value;
        }
        if let Some(value) = get("APP_PORT") {
            self.server.port = parse_env("APP_PORT", &value)?;
        }
        if let Some(value) = get("REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = get("DB_PATH") {
            self.storage.db_path = PathBuf::from(value);
        }
        if let Some(value) = get("UPLOADS_DIR") {
            self.storage.uploads_dir = PathBuf::from(value);
        }
        if let Some(value) = get("SECRET") {
            self.secret = Some(SecretString::from(value));
        }
        if let Some(value) = get("PUBLIC_BASE_URL") {
            self.public_base_url = Some(value);
        }
        if let Some(value) = get("LOG_LEVEL") {
            self.log_level = value.parse().map_err(ServiceError::ConfigError)?;
        }
        if let Some(value) = get("LOG_JSON") {
            self.log_json = parse_env("LOG_JSON", &value)?;
        }
        if let Some(value) = get("LOG_DIR") {
            self.log_dir = Some(PathBuf::from(value));
        }
        Ok(())
    }

    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            log_level: self.log_level.clone(),
            stdout: true,
            log_dir: self.log_dir.clone(),
            json_format: self.log_json,
        }
    }

    /// Turn settings into runtime options
    pub fn into_options(self) -> Result<AppOptions, ServiceError> {
        let public_base_url = self
            .public_base_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| ServiceError::ConfigError(format!("Invalid PUBLIC_BASE_URL: {e}")))?;
        let max_upload_bytes = self
            .server
            .max_upload_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| {
                ServiceError::ConfigError(format!(
                    "max_upload_mb too large: {}",
                    self.server.max_upload_mb
                ))
            })?;

        Ok(AppOptions {
            server: ServerOptions {
                host: self.server.host,
                port: self.server.port,
                request_timeout_secs: self.server.request_timeout_secs,
                max_upload_bytes,
            },
            storage: StorageOptions {
                layout: StorageLayout::new(self.storage.db_path, self.storage.uploads_dir),
            },
            public_base_url,
            secret: self.secret,
        })
    }
}
