//! Conversation persistence to disk
//!
//! One pretty-printed JSON file per conversation, named by its id.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
    error::{SessionError, SessionResult},
    models::Conversation,
};

/// Manages conversation files under a single directory
#[derive(Debug, Clone)]
pub struct ConversationStore {
    dir: PathBuf,
}

impl ConversationStore {
    /// Store under `~/.ochat/conversations/`
    pub async fn new() -> SessionResult<Self> {
        Self::with_dir(Self::default_dir()?).await
    }

    /// Store under a custom directory (created if missing)
    pub async fn with_dir(dir: impl Into<PathBuf>) -> SessionResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        debug!("ConversationStore initialized at {:?}", dir);
        Ok(Self { dir })
    }

    fn default_dir() -> SessionResult<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            SessionError::Config("Could not determine home directory".to_string())
        })?;
        Ok(home.join(".ochat").join("conversations"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    pub async fn save(&self, conversation: &Conversation) -> SessionResult<()> {
        let path = self.path_for(&conversation.id);
        let json = serde_json::to_string_pretty(conversation)?;
        fs::write(&path, json).await?;

        info!("Conversation saved: {} at {:?}", conversation.id, path);
        Ok(())
    }

    pub async fn load(&self, id: &Uuid) -> SessionResult<Conversation> {
        let path = self.path_for(id);
        if !fs::try_exists(&path).await? {
            return Err(SessionError::NotFound(id.to_string()));
        }

        let json = fs::read_to_string(&path).await?;
        let conversation: Conversation = serde_json::from_str(&json)?;

        debug!("Conversation loaded: {} from {:?}", id, path);
        Ok(conversation)
    }

    /// Every readable conversation, most recent first. Corrupt files are
    /// logged and skipped.
    pub async fn list(&self) -> SessionResult<Vec<Conversation>> {
        let mut conversations = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            match fs::read_to_string(&path).await {
                Ok(json) => match serde_json::from_str::<Conversation>(&json) {
                    Ok(conversation) => conversations.push(conversation),
                    Err(e) => error!("Failed to deserialize conversation {:?}: {}", path, e),
                },
                Err(e) => error!("Failed to read conversation {:?}: {}", path, e),
            }
        }

        conversations.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(conversations)
    }

    pub async fn delete(&self, id: &Uuid) -> SessionResult<()> {
        let path = self.path_for(id);
        if !fs::try_exists(&path).await? {
            return Err(SessionError::NotFound(id.to_string()));
        }

        fs::remove_file(&path).await?;
        info!("Conversation deleted: {}", id);
        Ok(())
    }
}
