//! Conversations command - browse and delete saved conversations

use async_trait::async_trait;
use ochat_sessions::{segment, ConversationStore};
use uuid::Uuid;

use super::Command;
use crate::{
    error::{CliError, CliResult},
    output::OutputStyle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationsAction {
    List,
    Show { id: String },
    Delete { id: String },
}

pub struct ConversationsCommand {
    action: ConversationsAction,
    store: Option<ConversationStore>,
}

impl ConversationsCommand {
    pub fn new(action: ConversationsAction) -> Self {
        Self {
            action,
            store: None,
        }
    }

    /// Use `store` instead of the one under the home directory
    pub fn with_store(mut self, store: ConversationStore) -> Self {
        self.store = Some(store);
        self
    }

    async fn store(&self) -> CliResult<ConversationStore> {
        match &self.store {
            Some(store) => Ok(store.clone()),
            None => Ok(ConversationStore::new().await?),
        }
    }

    async fn list(&self) -> CliResult<()> {
        let style = OutputStyle::default();
        let conversations = self.store().await?.list().await?;

        if conversations.is_empty() {
            println!("{}", style.info("No saved conversations"));
            return Ok(());
        }

        println!("{}", style.header("Conversations"));
        for conversation in &conversations {
            println!(
                "  {}  {}  {}",
                style.code(&conversation.id.to_string()),
                conversation.title,
                conversation.timestamp.format("%Y-%m-%d %H:%M")
            );
            println!("      {}", conversation.last_message_preview());
        }
        Ok(())
    }

    async fn show(&self, id: &str) -> CliResult<()> {
        let style = OutputStyle::default();
        let conversation = self.store().await?.load(&parse_id(id)?).await?;

        println!("{}", style.header(&conversation.title));
        for message in &conversation.messages {
            if message.is_from_user {
                println!("\n{}{}", style.prompt(">"), message.content);
            } else {
                let rendered: String = segment(&message.content)
                    .spans()
                    .iter()
                    .map(|span| style.span(span))
                    .collect();
                println!("\n{}", rendered);
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> CliResult<()> {
        let style = OutputStyle::default();
        self.store().await?.delete(&parse_id(id)?).await?;
        println!("{}", style.success(&format!("Deleted conversation {}", id)));
        Ok(())
    }
}

pub(crate) fn parse_id(id: &str) -> CliResult<Uuid> {
    Uuid::parse_str(id).map_err(|e| CliError::InvalidArgument {
        message: format!("'{}' is not a conversation id: {}", id, e),
    })
}

#[async_trait]
impl Command for ConversationsCommand {
    async fn execute(&self) -> CliResult<()> {
        match &self.action {
            ConversationsAction::List => self.list().await,
            ConversationsAction::Show { id } => self.show(id).await,
            ConversationsAction::Delete { id } => self.delete(id).await,
        }
    }
}
