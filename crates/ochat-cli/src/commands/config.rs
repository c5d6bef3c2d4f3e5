// Configuration management

use std::path::PathBuf;

use async_trait::async_trait;
use ochat_client::ServerConfig;

use super::Command;
use crate::{
    error::{CliError, CliResult},
    output::OutputStyle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Effective settings after every layer is applied
    Show,
    /// Persist one setting to the global file
    Set(String, String),
    Path,
}

/// Manage configuration
pub struct ConfigCommand {
    pub action: ConfigAction,
    /// Overrides the global file location
    target: Option<PathBuf>,
}

impl ConfigCommand {
    pub fn new(action: ConfigAction) -> Self {
        Self {
            action,
            target: None,
        }
    }

    /// Write settings to `path` instead of `~/.ochat/config.yaml`
    pub fn with_target(mut self, path: impl Into<PathBuf>) -> Self {
        self.target = Some(path.into());
        self
    }

    fn target_path(&self) -> CliResult<PathBuf> {
        self.target
            .clone()
            .or_else(ServerConfig::global_config_path)
            .ok_or_else(|| CliError::Internal("Could not determine home directory".to_string()))
    }

    fn show(&self) -> CliResult<()> {
        let style = OutputStyle::default();
        let config = ServerConfig::load_with_precedence()?;

        println!("{}", style.header("Server configuration"));
        for (key, value) in config.entries() {
            println!("{}", style.key_value(key, value));
        }
        println!();
        println!("{}", style.info(&format!("Base URL: {}", config.base_url())));
        Ok(())
    }

    /// Update one key in the target file, keeping its other keys.
    /// Returns the stored value after digit filtering.
    pub fn set(&self, key: &str, value: &str) -> CliResult<String> {
        let path = self.target_path()?;

        let mut config = ServerConfig::default();
        if path.exists() {
            config.merge_from_file(&path)?;
        }
        config.set(key, value)?;
        config.save(&path)?;

        Ok(config.get(key).unwrap_or_default().to_string())
    }

    fn path(&self) -> CliResult<()> {
        let style = OutputStyle::default();
        let global = self.target_path()?;
        println!("{}", style.key_value("global", &global.display().to_string()));
        println!(
            "{}",
            style.key_value(
                "project",
                &ServerConfig::project_config_path().display().to_string()
            )
        );
        Ok(())
    }
}

#[async_trait]
impl Command for ConfigCommand {
    async fn execute(&self) -> CliResult<()> {
        match &self.action {
            ConfigAction::Show => self.show(),
            ConfigAction::Set(key, value) => {
                let stored = self.set(key, value)?;
                let style = OutputStyle::default();
                println!("{}", style.success(&format!("Set {} = {}", key, stored)));
                Ok(())
            }
            ConfigAction::Path => self.path(),
        }
    }
}
