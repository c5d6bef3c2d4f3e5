//! HTTP client for the Ollama daemon
//!
//! Each method is a single request/response exchange, except pulls and chat
//! turns which hand back a stream folded by [`crate::streaming`]. Mutating
//! calls do not refresh anything themselves; see [`crate::ModelManager`].

use std::{sync::Arc, time::Duration};

use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::{
    config::ServerConfig,
    error::ClientError,
    models::{ChatTurn, CopyRequest, DeleteRequest, ModelDescriptor, PullRequest, TagsResponse},
    streaming::{ndjson_lines, progress_stream, response_stream, ProgressStream, ResponseStream},
    Result,
};

/// Default pool idle timeout (90 seconds)
const DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Default TCP keep-alive interval (60 seconds)
const DEFAULT_TCP_KEEPALIVE_SECS: u64 = 60;

/// Ollama error body, `{"error": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Typed wrapper around the daemon's REST endpoints
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Arc<Client>,
    config: ServerConfig,
}

impl OllamaClient {
    /// Build a client for the given settings.
    ///
    /// The address is not validated here; a malformed host/port surfaces as
    /// [`ClientError::InvalidUrl`] from each operation.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.request_timeout())
            .timeout(config.resource_timeout())
            .pool_idle_timeout(Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT_SECS))
            .tcp_keepalive(Duration::from_secs(DEFAULT_TCP_KEEPALIVE_SECS))
            .build()
            .map_err(|e| ClientError::Generic(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http: Arc::new(client),
            config,
        })
    }

    /// Client for `http://127.0.0.1:11434` with default timeouts
    pub fn with_default_config() -> Result<Self> {
        Self::new(ServerConfig::default())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn base_url(&self) -> String {
        self.config.base_url()
    }

    /// `GET /api/tags`
    pub async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        let url = self.config.endpoint("/api/tags")?;
        debug!("Listing models from {}", url);

        let response = self.http.get(url).send().await?;
        let response = check_status(response).await?;

        let body = response.text().await?;
        let tags: TagsResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse tags response: {}", e);
            ClientError::InvalidData(e.to_string())
        })?;

        debug!("Listed {} models", tags.models.len());
        Ok(tags.models)
    }

    /// `POST /api/pull`, streamed.
    ///
    /// Connection and status failures are returned directly; anything after
    /// the first byte arrives as an `Err` item in the stream.
    pub async fn pull_model(&self, name: &str) -> Result<ProgressStream> {
        validate_name(name)?;

        let url = self.config.endpoint("/api/pull")?;
        debug!("Pulling model: {}", name);

        let response = self
            .http
            .post(url)
            .json(&PullRequest { name, stream: true })
            .send()
            .await?;
        let response = check_status(response).await?;

        Ok(progress_stream(ndjson_lines(response.bytes_stream())))
    }

    /// `DELETE /api/delete`
    pub async fn delete_model(&self, name: &str) -> Result<()> {
        validate_name(name)?;

        let url = self.config.endpoint("/api/delete")?;
        debug!("Deleting model: {}", name);

        let response = self
            .http
            .delete(url)
            .json(&DeleteRequest { name })
            .send()
            .await?;
        check_status(response).await?;

        info!("Deleted model: {}", name);
        Ok(())
    }

    /// `POST /api/copy`
    pub async fn copy_model(&self, source: &str, destination: &str) -> Result<()> {
        validate_name(source)?;
        validate_name(destination)?;

        let url = self.config.endpoint("/api/copy")?;
        debug!("Copying model {} to {}", source, destination);

        let response = self
            .http
            .post(url)
            .json(&CopyRequest {
                source,
                destination,
            })
            .send()
            .await?;
        check_status(response).await?;

        info!("Copied model {} to {}", source, destination);
        Ok(())
    }

    /// `POST /api/generate`, streamed. Items carry each record's delta.
    pub async fn send_chat(&self, turn: &ChatTurn) -> Result<ResponseStream> {
        turn.validate()?;

        let url = self.config.endpoint("/api/generate")?;
        debug!(
            "Sending chat turn to {} (image attached: {})",
            turn.model,
            turn.image.is_some()
        );

        let response = self
            .http
            .post(url)
            .json(&turn.to_request())
            .send()
            .await?;
        let response = check_status(response).await?;

        Ok(response_stream(ndjson_lines(response.bytes_stream())))
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ClientError::Generic("Model name cannot be empty".to_string()));
    }
    Ok(())
}

/// Turn a non-2xx response into [`ClientError::InvalidResponse`]
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error)
        .unwrap_or(text);

    error!("Ollama API error ({}): {}", status, body);
    Err(ClientError::InvalidResponse {
        status: status.as_u16(),
        body,
    })
}
