//! AdoteMe App
//!
//! Wires configuration, logging, the configured backend and the catalog.

use std::sync::Arc;
use std::time::Duration;

use adoteme_store::{BlobStore, DocumentStore, FirebaseStorage, FirestoreStore};
use rolling_logger::LoggerError;
use thiserror::Error;

use crate::commands::RemoteClient;
use crate::config::{AppConfig, Backend, ConfigError};
use crate::context::CatalogController;
use crate::seed;
use crate::store::CatalogRepository;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logger(#[from] LoggerError),
    #[error("bundled seed catalog is invalid: {0}")]
    Seed(#[from] serde_json::Error),
}

/// Application services handed to the presentation layer
pub struct App {
    pub config: AppConfig,
    pub client: RemoteClient,
    pub catalog: CatalogController,
}

impl App {
    /// Initialise logging and build the configured backend
    pub fn bootstrap(config: AppConfig) -> Result<Self, AppError> {
        config.validate()?;

        match rolling_logger::init_logger(&config.log.to_logger_config()) {
            Ok(()) => {}
            // embedders and tests may have installed their own subscriber
            Err(LoggerError::Init(reason)) => log::warn!("keeping existing logger: {}", reason),
            Err(e) => return Err(e.into()),
        }
        rolling_logger::info(&format!("adoteme starting, log level {}", config.log.level));

        Self::with_config(config)
    }

    /// Build the configured backend without touching logging
    pub fn with_config(config: AppConfig) -> Result<Self, AppError> {
        let client = build_client(&config)?;
        log::info!("starting with {:?} backend", config.backend);
        Ok(Self::with_client(config, client))
    }

    /// Build the catalog over an existing client
    pub fn with_client(config: AppConfig, client: RemoteClient) -> Self {
        let repository = Arc::new(CatalogRepository::new(client.clone(), config.catalog.refresh_policy));
        let catalog = CatalogController::new(repository, config.catalog.persist());
        Self { config, client, catalog }
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .ok_or_else(|| ConfigError::Invalid(format!("firebase.{} is required", name)))
}

fn build_client(config: &AppConfig) -> Result<RemoteClient, AppError> {
    match config.backend {
        Backend::Seed => {
            let latency = Duration::from_millis(config.catalog.simulated_latency_ms);
            let store = Arc::new(seed::seed_store_with_latency(latency)?);
            Ok(RemoteClient::in_memory(store))
        }
        Backend::Firebase => {
            let firebase = &config.firebase;
            let project_id = required(&firebase.project_id, "project_id")?;
            let bucket = required(&firebase.storage_bucket, "storage_bucket")?;

            let mut documents = FirestoreStore::with_endpoint(
                adoteme_store::repository::FIRESTORE_API,
                project_id,
                &firebase.database,
                firebase.api_key.clone(),
            );
            let mut blobs = FirebaseStorage::new(bucket);
            if let Some(token) = &firebase.id_token {
                documents = documents.with_id_token(token.clone());
                blobs = blobs.with_id_token(token.clone());
            }

            let documents: Arc<dyn DocumentStore> = Arc::new(documents);
            let blobs: Arc<dyn BlobStore> = Arc::new(blobs);
            Ok(RemoteClient::new(documents, blobs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::context::LoadState;
    use crate::store::{Persist, RefreshPolicy};

    #[tokio::test]
    async fn test_seed_app_loads_catalog() {
        let app = App::with_config(AppConfig::default()).expect("App failed to build");

        app.catalog.refresh().await.unwrap();
        assert_eq!(app.catalog.load_state().await, LoadState::Loaded);
        assert_eq!(app.catalog.filtered_view().await.len(), 5);
    }

    #[tokio::test]
    async fn test_catalog_settings_are_applied() {
        let config = AppConfig {
            catalog: CatalogConfig {
                persist_favorites: true,
                refresh_policy: RefreshPolicy::LatestIssued,
                simulated_latency_ms: 0,
            },
            ..Default::default()
        };
        let app = App::with_config(config).unwrap();
        assert_eq!(app.catalog.repository().policy(), RefreshPolicy::LatestIssued);
        assert_eq!(app.config.catalog.persist(), Persist::Remote);
    }

    #[test]
    fn test_firebase_app_builds_without_network() {
        let mut config = AppConfig {
            backend: Backend::Firebase,
            ..Default::default()
        };
        config.firebase.project_id = Some("adoteme-demo".into());
        config.firebase.storage_bucket = Some("adoteme-demo.appspot.com".into());
        config.firebase.id_token = Some("token".into());

        assert!(App::with_config(config).is_ok());
    }

    #[test]
    fn test_firebase_without_settings_fails() {
        let config = AppConfig {
            backend: Backend::Firebase,
            ..Default::default()
        };
        assert!(matches!(App::bootstrap(config), Err(AppError::Config(_))));
    }
}
