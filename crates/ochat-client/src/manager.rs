//! Model lifecycle management on top of [`OllamaClient`]
//!
//! The catalog is the one piece of shared state: many readers, written only
//! by a refresh, replaced wholesale so the last refresh wins.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    client::OllamaClient,
    models::{DownloadProgress, ModelDescriptor},
    streaming::ProgressAccumulator,
    Result,
};

/// Snapshot-on-read list of installed models
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: Arc<RwLock<Vec<ModelDescriptor>>>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole list
    pub async fn replace(&self, models: Vec<ModelDescriptor>) {
        *self.models.write().await = models;
    }

    pub async fn snapshot(&self) -> Vec<ModelDescriptor> {
        self.models.read().await.clone()
    }

    pub async fn names(&self) -> Vec<String> {
        self.models
            .read()
            .await
            .iter()
            .map(|m| m.name.clone())
            .collect()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.models.read().await.iter().any(|m| m.name == name)
    }

    /// Preselected source for "duplicate model": the first listed model
    pub async fn default_duplicate_source(&self) -> Option<String> {
        self.models.read().await.first().map(|m| m.name.clone())
    }
}

/// Result of a pull followed by a refresh
#[derive(Debug, Clone)]
pub struct PullOutcome {
    pub progress: DownloadProgress,
    pub models: Vec<ModelDescriptor>,
}

/// Runs mutating model operations and refreshes the catalog after each one
#[derive(Debug, Clone)]
pub struct ModelManager {
    client: OllamaClient,
    catalog: ModelCatalog,
}

impl ModelManager {
    pub fn new(client: OllamaClient) -> Self {
        Self {
            client,
            catalog: ModelCatalog::new(),
        }
    }

    pub fn with_catalog(client: OllamaClient, catalog: ModelCatalog) -> Self {
        Self { client, catalog }
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Re-list models. On failure the catalog keeps its previous contents.
    pub async fn refresh(&self) -> Result<Vec<ModelDescriptor>> {
        let models = self.client.list_models().await?;
        self.catalog.replace(models.clone()).await;
        debug!("Catalog refreshed with {} models", models.len());
        Ok(models)
    }

    /// Pull a model, reporting each cumulative update, then refresh.
    ///
    /// If the stream fails, `on_progress` has already seen the last good
    /// values and the error is returned without touching the catalog.
    pub async fn pull_and_refresh<F>(&self, name: &str, mut on_progress: F) -> Result<PullOutcome>
    where
        F: FnMut(&DownloadProgress),
    {
        let mut stream = self.client.pull_model(name).await?;
        let mut last = ProgressAccumulator::new().snapshot();

        while let Some(update) = stream.next().await {
            match update {
                Ok(progress) => {
                    on_progress(&progress);
                    last = progress;
                }
                Err(e) => {
                    warn!("Pull of {} failed at {}: {}", name, last.display(), e);
                    return Err(e);
                }
            }
        }

        info!("Pulled model {} ({})", name, last.display());
        let models = self.refresh().await?;
        Ok(PullOutcome {
            progress: last,
            models,
        })
    }

    pub async fn delete_and_refresh(&self, name: &str) -> Result<Vec<ModelDescriptor>> {
        self.client.delete_model(name).await?;
        self.refresh().await
    }

    pub async fn duplicate_and_refresh(
        &self,
        source: &str,
        destination: &str,
    ) -> Result<Vec<ModelDescriptor>> {
        self.client.copy_model(source, destination).await?;
        self.refresh().await
    }
}
