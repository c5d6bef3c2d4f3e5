//! Ollama client for ochat
//!
//! This crate talks to a locally running Ollama daemon: listing, pulling,
//! duplicating and deleting models, and streaming chat turns. Streamed
//! responses are folded into cumulative progress or text as they arrive.

pub mod client;
pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod streaming;

pub use client::OllamaClient;
pub use config::ServerConfig;
pub use error::{ClientError, ConfigError, ErrorKind, ErrorNotice};
pub use manager::{ModelCatalog, ModelManager, PullOutcome};
pub use models::{ChatTurn, DownloadProgress, ImageAttachment, ModelDescriptor};
pub use streaming::{
    ndjson_lines, ProgressAccumulator, ProgressStream, ResponseAccumulator, ResponseStream,
    ResponseUpdate,
    DEFAULT_TOTAL_BYTES,
};

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
