//! # Mixture storage strategies
//!
//! `MixtureBackend` is the single interface the rest of the crate talks to. Two
//! strategies implement it:
//! - `LocalBackend`: a JSON array in a key-value store (the browser's localStorage
//!   equivalent), capped at ten entries
//! - `CloudBackend`: documents in a remote database, with the local cache as the
//!   fallback for reads
//!
//! The strategy is chosen once by `StorageBackend::from_config` and never changes.
//! Reads never fail (they degrade to the cache or to an empty list); writes report
//! their errors to the caller and are not retried or redirected.

use super::appwrite_client::AppwriteClient;
use super::cloud_backend::CloudBackend;
use super::local_backend::LocalBackend;
use super::local_store::{JsonFileStore, MixtureCache};
use super::mixture::Mixture;
use crate::settings::{LabConfig, StorageMode};
use enum_dispatch::enum_dispatch;
use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Remote database answered {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Cannot save an empty mixture")]
    EmptyMixture,
    #[error("Missing configuration value: {0}")]
    MissingConfig(&'static str),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Api { status: 404, .. })
    }
}

#[enum_dispatch]
pub trait MixtureBackend {
    fn mode(&self) -> StorageMode;
    /// Persists a mixture and returns it as stored (the cloud assigns its own id).
    fn save(&mut self, mixture: &Mixture) -> Result<Mixture, StorageError>;
    /// Most-recent-first, at most ten. Never fails.
    fn load(&mut self) -> Vec<Mixture>;
    /// Unknown ids are a no-op.
    fn delete(&mut self, id: &str) -> Result<(), StorageError>;
    /// Best effort; returns how many mixtures were removed.
    fn clear_all(&mut self) -> Result<usize, StorageError>;
}

#[enum_dispatch(MixtureBackend)]
pub enum StorageBackend {
    Local(LocalBackend),
    Cloud(CloudBackend),
}

impl StorageBackend {
    /// Picks the strategy from the configuration: cloud when the database and the
    /// collection ids are both set, local otherwise.
    pub fn from_config(config: &LabConfig) -> Result<Self, StorageError> {
        let cache = MixtureCache::new(Box::new(JsonFileStore::new(&config.local_store_path)));
        match (config.database_id(), config.mixtures_collection_id()) {
            (Some(database_id), Some(collection_id)) => {
                if config.appwrite_project_id.trim().is_empty() {
                    return Err(StorageError::MissingConfig("appwriteProjectId"));
                }
                let client = AppwriteClient::new(
                    &config.appwrite_endpoint,
                    &config.appwrite_project_id,
                    config.appwrite_api_key.as_deref(),
                )?;
                info!(
                    "Mixtures stored in cloud mode (database '{}', collection '{}')",
                    database_id, collection_id
                );
                Ok(StorageBackend::Cloud(CloudBackend::new(
                    Box::new(client),
                    database_id,
                    collection_id,
                    &config.user_id,
                    cache,
                )))
            }
            _ => {
                info!(
                    "Mixtures stored in local mode ('{}')",
                    config.local_store_path
                );
                Ok(StorageBackend::Local(LocalBackend::new(cache)))
            }
        }
    }
}
