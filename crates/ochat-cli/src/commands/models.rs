//! Models command - list, pull, duplicate and delete daemon models

use async_trait::async_trait;
use ochat_client::{ModelDescriptor, ModelManager};

use super::{connect, Command};
use crate::{
    error::{CliError, CliResult},
    output::OutputStyle,
    progress,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelsAction {
    List,
    Pull { name: String },
    Delete { name: String },
    /// Copy `from` (or the first installed model) to `destination`
    Copy {
        destination: String,
        from: Option<String>,
    },
}

pub struct ModelsCommand {
    action: ModelsAction,
}

impl ModelsCommand {
    pub fn new(action: ModelsAction) -> Self {
        Self { action }
    }

    async fn list(&self, manager: &ModelManager) -> CliResult<()> {
        let spinner = progress::create_spinner("Fetching models");
        let result = manager.refresh().await;
        spinner.finish_and_clear();

        print_models(&result?);
        Ok(())
    }

    async fn pull(&self, manager: &ModelManager, name: &str) -> CliResult<()> {
        let style = OutputStyle::default();
        let bar = progress::create_pull_bar(name);

        let result = manager
            .pull_and_refresh(name, |p| progress::update_pull_bar(&bar, p))
            .await;

        match result {
            Ok(outcome) => {
                progress::update_pull_bar(&bar, &outcome.progress);
                bar.finish();
                println!("{}", style.success(&format!("Pulled {}", name)));
                Ok(())
            }
            Err(e) => {
                progress::clear_pull_bar(&bar);
                Err(e.into())
            }
        }
    }

    async fn delete(&self, manager: &ModelManager, name: &str) -> CliResult<()> {
        let style = OutputStyle::default();
        let models = manager.delete_and_refresh(name).await?;
        println!("{}", style.success(&format!("Deleted {}", name)));
        print_models(&models);
        Ok(())
    }

    async fn copy(
        &self,
        manager: &ModelManager,
        destination: &str,
        from: Option<&str>,
    ) -> CliResult<()> {
        let style = OutputStyle::default();

        let source = match from {
            Some(source) => source.to_string(),
            None => {
                manager.refresh().await?;
                manager
                    .catalog()
                    .default_duplicate_source()
                    .await
                    .ok_or_else(|| CliError::InvalidArgument {
                        message: "No models installed to duplicate; pass --from".to_string(),
                    })?
            }
        };

        let models = manager.duplicate_and_refresh(&source, destination).await?;
        println!(
            "{}",
            style.success(&format!("Copied {} to {}", source, destination))
        );
        print_models(&models);
        Ok(())
    }
}

fn print_models(models: &[ModelDescriptor]) {
    let style = OutputStyle::default();

    if models.is_empty() {
        println!("{}", style.info("No models installed"));
        return;
    }

    println!("{}", style.header("Installed models"));
    for model in models {
        println!(
            "{}",
            style.list_item(&format!("{}  {}", model.name, style.size(model.size_mb())))
        );
    }
}

#[async_trait]
impl Command for ModelsCommand {
    async fn execute(&self) -> CliResult<()> {
        let manager = ModelManager::new(connect()?);

        match &self.action {
            ModelsAction::List => self.list(&manager).await,
            ModelsAction::Pull { name } => self.pull(&manager, name).await,
            ModelsAction::Delete { name } => self.delete(&manager, name).await,
            ModelsAction::Copy { destination, from } => {
                self.copy(&manager, destination, from.as_deref()).await
            }
        }
    }
}
