//! Data models for the Ollama API and chat turns

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::{error::ClientError, Result};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// A model installed on the daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ModelDescriptor {
    /// Model name/tag (e.g. "llama3:latest"), unique within a listing
    pub name: String,

    /// Size on disk in bytes
    #[serde(default)]
    pub size: u64,

    /// Content digest reported by the server
    #[serde(default)]
    pub digest: String,
}

impl ModelDescriptor {
    /// Stand-in used before a listing is available, e.g. a typed-in
    /// duplication target
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            digest: String::new(),
        }
    }

    /// Size in whole megabytes, truncated
    pub fn size_mb(&self) -> u64 {
        self.size / BYTES_PER_MB
    }
}

/// State of an in-flight model pull
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadProgress {
    /// Latest status line from the server ("pulling manifest", "success", ...)
    pub status: Option<String>,

    /// Bytes received so far
    pub completed_bytes: u64,

    /// Expected size; the server may revise it while pulling
    pub total_bytes: u64,
}

impl DownloadProgress {
    /// Fraction done, clamped to `[0, 1]` whatever the server reports
    pub fn ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            return if self.completed_bytes > 0 { 1.0 } else { 0.0 };
        }
        (self.completed_bytes as f64 / self.total_bytes as f64).clamp(0.0, 1.0)
    }

    /// Progress percentage (0-100)
    pub fn percentage(&self) -> f64 {
        self.ratio() * 100.0
    }

    pub fn completed_mb(&self) -> u64 {
        self.completed_bytes / BYTES_PER_MB
    }

    pub fn total_mb(&self) -> u64 {
        self.total_bytes / BYTES_PER_MB
    }

    /// Check if the pull has transferred everything it announced
    pub fn is_complete(&self) -> bool {
        self.total_bytes > 0 && self.completed_bytes >= self.total_bytes
    }

    /// `"{completed}/ {total} MB"` as shown next to the progress bar
    pub fn display(&self) -> String {
        format!("{}/ {} MB", self.completed_mb(), self.total_mb())
    }
}

/// Image payload attached to a chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    /// MIME type, `image/png` or `image/jpeg`
    pub mime: String,
    pub data: Vec<u8>,
    /// Standard base64 of `data`, as sent to the server
    pub base64: String,
}

impl ImageAttachment {
    pub fn from_bytes(data: Vec<u8>, mime: impl Into<String>) -> Result<Self> {
        let mime = mime.into();
        if mime != "image/png" && mime != "image/jpeg" {
            return Err(ClientError::Generic(format!(
                "Unsupported image type {}; use PNG or JPEG",
                mime
            )));
        }
        if data.is_empty() {
            return Err(ClientError::Generic("Image file is empty".to_string()));
        }

        let base64 = STANDARD.encode(&data);
        Ok(Self { mime, data, base64 })
    }

    /// Read a PNG or JPEG file; the type is taken from the extension
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mime = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string())
            .ok_or_else(|| {
                ClientError::Generic(format!("Cannot tell image type of {}", path.display()))
            })?;

        let data = tokio::fs::read(path).await.map_err(|e| {
            ClientError::Generic(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_bytes(data, mime)
    }
}

/// One user submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub model: String,
    pub prompt: String,
    /// Overrides the model's system prompt when set
    pub system: Option<String>,
    pub image: Option<ImageAttachment>,
}

impl ChatTurn {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            image: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        let system = system.into();
        self.system = (!system.trim().is_empty()).then_some(system);
        self
    }

    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }

    /// A turn needs a model, and text unless an image is attached
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ClientError::Generic("No model selected".to_string()));
        }
        if self.prompt.trim().is_empty() && self.image.is_none() {
            return Err(ClientError::Generic("Prompt cannot be empty".to_string()));
        }
        Ok(())
    }

    pub(crate) fn to_request(&self) -> GenerateRequest<'_> {
        GenerateRequest {
            model: &self.model,
            prompt: &self.prompt,
            system: self.system.as_deref(),
            images: self.image.as_ref().map(|image| vec![image.base64.as_str()]),
            stream: true,
        }
    }
}

/// `GET /api/tags` body
#[derive(Debug, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
}

/// `POST /api/generate` body
#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<&'a str>>,
    pub stream: bool,
}

/// `POST /api/pull` body
#[derive(Debug, Serialize)]
pub(crate) struct PullRequest<'a> {
    pub name: &'a str,
    pub stream: bool,
}

/// `DELETE /api/delete` body
#[derive(Debug, Serialize)]
pub(crate) struct DeleteRequest<'a> {
    pub name: &'a str,
}

/// `POST /api/copy` body
#[derive(Debug, Serialize)]
pub(crate) struct CopyRequest<'a> {
    pub source: &'a str,
    pub destination: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(completed: u64, total: u64) -> DownloadProgress {
        DownloadProgress {
            status: None,
            completed_bytes: completed,
            total_bytes: total,
        }
    }

    #[test]
    fn test_ratio_clamps_overshoot() {
        assert_eq!(progress(4096, 2048).ratio(), 1.0);
        assert_eq!(progress(5, 0).ratio(), 1.0);
        assert_eq!(progress(0, 0).ratio(), 0.0);
        assert_eq!(progress(1024, 2048).ratio(), 0.5);
    }

    #[test]
    fn test_display_in_megabytes() {
        let p = progress(3 * 1024 * 1024 + 10, 8 * 1024 * 1024);
        assert_eq!(p.display(), "3/ 8 MB");
    }

    #[test]
    fn test_size_mb_truncates() {
        let model = ModelDescriptor {
            name: "llama3".into(),
            size: 4_000_000_000,
            digest: String::new(),
        };
        assert_eq!(model.size_mb(), 3814);
    }

    #[test]
    fn test_turn_requires_text_or_image() {
        assert!(ChatTurn::new("llama3", "   ").validate().is_err());
        assert!(ChatTurn::new("", "hi").validate().is_err());

        let image = ImageAttachment::from_bytes(vec![1, 2, 3], "image/png").unwrap();
        assert!(ChatTurn::new("llava", "").with_image(image).validate().is_ok());
    }

    #[test]
    fn test_blank_system_prompt_is_dropped() {
        let turn = ChatTurn::new("llama3", "hi").with_system("  ");
        assert!(turn.system.is_none());
    }

    #[test]
    fn test_request_body_shape() {
        let image = ImageAttachment::from_bytes(b"abc".to_vec(), "image/jpeg").unwrap();
        let turn = ChatTurn::new("llava", "what is this")
            .with_system("be brief")
            .with_image(image);

        let body = serde_json::to_value(turn.to_request()).unwrap();
        assert_eq!(body["model"], "llava");
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["images"][0], "YWJj");
        assert_eq!(body["stream"], true);

        let plain = serde_json::to_value(ChatTurn::new("llama3", "hi").to_request()).unwrap();
        assert!(plain.get("system").is_none());
        assert!(plain.get("images").is_none());
    }

    #[test]
    fn test_unsupported_image_type() {
        assert!(ImageAttachment::from_bytes(vec![1], "image/gif").is_err());
    }
}
