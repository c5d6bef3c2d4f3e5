//! Server connection settings
//!
//! Handles loading the user-editable key/value settings from:
//! 1. Environment variables (highest priority)
//! 2. Project config file (.ochat/config.yaml)
//! 3. Global config file (~/.ochat/config.yaml)
//! 4. Built-in defaults (lowest priority)
//!
//! Values are kept as strings, the way the settings form edits them. Numeric
//! keys silently drop any non-digit characters instead of failing.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, ConfigError};

pub const DEFAULT_HOST: &str = "http://127.0.0.1";
pub const DEFAULT_PORT: &str = "11434";
pub const DEFAULT_TIMEOUT_REQUEST: &str = "60";
pub const DEFAULT_TIMEOUT_RESOURCE: &str = "604800";

/// Keys accepted by [`ServerConfig::set`] and written to the config file
pub const CONFIG_KEYS: [&str; 4] = ["host", "port", "timeoutRequest", "timeoutResource"];

/// Connection settings for the Ollama daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Scheme and host, e.g. `http://127.0.0.1`
    pub host: String,
    /// Port as digits only
    pub port: String,
    /// Seconds allowed to establish a connection
    pub timeout_request: String,
    /// Seconds allowed for a whole request, streaming included
    pub timeout_resource: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT.to_string(),
            timeout_request: DEFAULT_TIMEOUT_REQUEST.to_string(),
            timeout_resource: DEFAULT_TIMEOUT_RESOURCE.to_string(),
        }
    }
}

/// Keep only ASCII digits
pub fn filter_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

impl ServerConfig {
    /// Load settings with precedence: env > project file > global file > defaults
    pub fn load_with_precedence() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(global_config_path) = Self::global_config_path() {
            if global_config_path.exists() {
                debug!("Loading global config from {:?}", global_config_path);
                config.merge_from_file(&global_config_path)?;
            }
        }

        let project_config_path = Self::project_config_path();
        if project_config_path.exists() {
            debug!("Loading project config from {:?}", project_config_path);
            config.merge_from_file(&project_config_path)?;
        }

        config.load_from_env();

        Ok(config)
    }

    /// `~/.ochat/config.yaml`, if a home directory can be determined
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".ochat").join("config.yaml"))
    }

    /// `.ochat/config.yaml` relative to the working directory
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".ochat").join("config.yaml")
    }

    /// Apply `OCHAT_*` environment overrides
    pub fn load_from_env(&mut self) {
        let overrides = [
            ("OCHAT_HOST", "host"),
            ("OCHAT_PORT", "port"),
            ("OCHAT_TIMEOUT_REQUEST", "timeoutRequest"),
            ("OCHAT_TIMEOUT_RESOURCE", "timeoutResource"),
        ];

        for (var, key) in overrides {
            if let Ok(value) = std::env::var(var) {
                debug!("Loading {} from environment: {}", var, value);
                // Keys are fixed above, set() cannot fail on them
                let _ = self.set(key, &value);
            }
        }
    }

    /// Merge values from a YAML file; keys absent from the file keep their value
    pub fn merge_from_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;

        if content.trim().is_empty() {
            return Ok(());
        }

        let file_config: FileConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;

        if let Some(host) = file_config.host {
            self.host = host.into_string();
        }
        if let Some(port) = file_config.port {
            self.port = filter_digits(&port.into_string());
        }
        if let Some(timeout) = file_config.timeout_request {
            self.timeout_request = filter_digits(&timeout.into_string());
        }
        if let Some(timeout) = file_config.timeout_resource {
            self.timeout_resource = filter_digits(&timeout.into_string());
        }

        Ok(())
    }

    /// Write every key to `path`, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Write(format!("{}: {}", parent.display(), e)))?;
        }

        let yaml = serde_yaml::to_string(self).map_err(|e| ConfigError::Write(e.to_string()))?;
        std::fs::write(path, yaml)
            .map_err(|e| ConfigError::Write(format!("{}: {}", path.display(), e)))?;

        debug!("Saved config to {:?}", path);
        Ok(())
    }

    /// Update one setting. Numeric settings are digit-filtered.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "host" => self.host = value.trim().to_string(),
            "port" => self.port = filter_digits(value),
            "timeoutRequest" => self.timeout_request = filter_digits(value),
            "timeoutResource" => self.timeout_resource = filter_digits(value),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "host" => Some(self.host.as_str()),
            "port" => Some(self.port.as_str()),
            "timeoutRequest" => Some(self.timeout_request.as_str()),
            "timeoutResource" => Some(self.timeout_resource.as_str()),
            _ => None,
        }
    }

    /// All settings in display order
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        CONFIG_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }

    /// `host:port`, without validation
    pub fn base_url(&self) -> String {
        format!("{}:{}", self.host.trim_end_matches('/'), self.port)
    }

    /// Resolve an API path against the configured server
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let base = Url::parse(&self.base_url())?;

        if !matches!(base.scheme(), "http" | "https") || base.host_str().is_none() {
            return Err(ClientError::InvalidUrl(format!(
                "expected http(s)://host, got {}",
                self.base_url()
            )));
        }

        Ok(base.join(path)?)
    }

    /// Connection timeout
    pub fn request_timeout(&self) -> Duration {
        parse_seconds(&self.timeout_request, DEFAULT_TIMEOUT_REQUEST)
    }

    /// Whole-request timeout
    pub fn resource_timeout(&self) -> Duration {
        parse_seconds(&self.timeout_resource, DEFAULT_TIMEOUT_RESOURCE)
    }
}

fn parse_seconds(value: &str, fallback: &str) -> Duration {
    let secs = match value.parse::<u64>() {
        Ok(secs) if secs > 0 => secs,
        _ => {
            if !value.is_empty() {
                warn!("Ignoring timeout value {:?}, using {}s", value, fallback);
            }
            fallback.parse().unwrap_or(60)
        }
    };
    Duration::from_secs(secs)
}

/// YAML file layout (all keys optional)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    host: Option<Scalar>,
    port: Option<Scalar>,
    timeout_request: Option<Scalar>,
    timeout_resource: Option<Scalar>,
}

/// Hand-edited files may write `port: 11434` as a number
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(u64),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(text) => text,
            Scalar::Number(number) => number.to_string(),
        }
    }
}
