// Command handlers for the ochat CLI

pub mod chat;
pub mod config;
pub mod conversations;
pub mod models;

pub use chat::ChatCommand;
pub use config::{ConfigAction, ConfigCommand};
pub use conversations::{ConversationsAction, ConversationsCommand};
pub use models::{ModelsAction, ModelsCommand};

use ochat_client::{OllamaClient, ServerConfig};
use tracing::debug;

use crate::error::CliResult;

/// Trait for command handlers
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command
    async fn execute(&self) -> CliResult<()>;
}

/// Client for the configured daemon
pub(crate) fn connect() -> CliResult<OllamaClient> {
    let config = ServerConfig::load_with_precedence()?;
    debug!("Using daemon at {}", config.base_url());
    Ok(OllamaClient::new(config)?)
}
