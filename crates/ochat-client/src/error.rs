//! Error taxonomy for model-server operations
//!
//! Every client operation resolves to exactly one of five classifications.
//! The presentation layer only ever needs the [`ErrorNotice`] pair derived
//! from it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by [`crate::OllamaClient`] operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The configured host/port does not form a well-formed request target
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The connection could not be established or broke mid-transfer
    #[error("Server unreachable: {0}")]
    Unreachable(String),

    /// The server answered with a non-success status code
    #[error("Invalid response: HTTP {status}")]
    InvalidResponse { status: u16, body: String },

    /// The body could not be parsed into the expected structure
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Anything else, wrapped with its description
    #[error("{0}")]
    Generic(String),
}

/// Errors reading or writing the settings file
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to write config: {0}")]
    Write(String),

    #[error("Unknown setting: {0}")]
    UnknownKey(String),
}

/// Discriminant of [`ClientError`], handy for matching in callers and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidUrl,
    Unreachable,
    InvalidResponse,
    InvalidData,
    Generic,
}

/// Title and message pair shown to the user for a failed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub title: String,
    pub message: String,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::InvalidUrl(_) => ErrorKind::InvalidUrl,
            ClientError::Unreachable(_) => ErrorKind::Unreachable,
            ClientError::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            ClientError::InvalidData(_) => ErrorKind::InvalidData,
            ClientError::Generic(_) => ErrorKind::Generic,
        }
    }

    /// Short heading for the failure
    pub fn title(&self) -> &'static str {
        match self {
            ClientError::InvalidUrl(_) => "Invalid URL",
            ClientError::Unreachable(_) => "Server Unreachable",
            ClientError::InvalidResponse { .. } => "Invalid Response",
            ClientError::InvalidData(_) => "Invalid Data",
            ClientError::Generic(_) => "Error",
        }
    }

    /// Human readable explanation, including the underlying cause when known
    pub fn message(&self) -> String {
        match self {
            ClientError::InvalidUrl(detail) => format!(
                "The server address is not a valid URL. Check host and port in settings. ({})",
                detail
            ),
            ClientError::Unreachable(detail) => format!(
                "Could not connect to the Ollama server. Make sure it is running. ({})",
                detail
            ),
            ClientError::InvalidResponse { status, body } if body.is_empty() => {
                format!("The server responded with status {}.", status)
            }
            ClientError::InvalidResponse { status, body } => {
                format!("The server responded with status {}: {}", status, body)
            }
            ClientError::InvalidData(detail) => {
                format!("The server sent data that could not be read. ({})", detail)
            }
            ClientError::Generic(detail) => detail.clone(),
        }
    }

    pub fn notice(&self) -> ErrorNotice {
        ErrorNotice {
            title: self.title().to_string(),
            message: self.message(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ClientError::InvalidUrl(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::InvalidResponse {
                status: status.as_u16(),
                body: String::new(),
            }
        } else if err.is_decode() {
            ClientError::InvalidData(err.to_string())
        } else if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
            ClientError::Unreachable(err.to_string())
        } else {
            ClientError::Generic(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::InvalidData(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Generic(err.to_string())
    }
}
