use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::storage::filesystem::FilesystemFileStore;
use tracing::info;

use crate::config::AppConfig;
use crate::registry::{
    ContributorStore, DatasetStore, HttpFetcher, Registry, RegistrySettings,
};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub config: AppConfig,
}

impl AppState {
    /// Build the registry from configuration: create the data directories,
    /// then load both indexes once so unreadable state fails at startup.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let storage = &config.storage;

        let files = FilesystemFileStore::new(storage.datasets_dir(), storage.max_upload_size)
            .await
            .with_context(|| {
                format!(
                    "Failed to prepare dataset directory {}",
                    storage.datasets_dir().display()
                )
            })?;

        let fetcher = HttpFetcher::new(
            Duration::from_secs(config.verification.fetch_timeout_secs),
            storage.max_upload_size,
        )
        .context("Failed to build contributor fetch client")?;

        let registry = Registry::new(
            DatasetStore::new(storage.datasets_index()),
            ContributorStore::new(storage.contributors_index()),
            Arc::new(files),
            Arc::new(fetcher),
            RegistrySettings {
                verification_threshold: config.verification.threshold,
                max_upload_size: storage.max_upload_size,
            },
        );

        let (datasets, claims) = registry
            .check_stores()
            .await
            .context("Failed to load registry indexes")?;
        info!(
            data_dir = %storage.data_dir.display(),
            datasets,
            claims,
            "Registry loaded"
        );

        Ok(Self {
            registry: Arc::new(registry),
            config,
        })
    }
}
