//! # Settings Module
//!
//! ## Purpose
//! Configuration of the Virtual Lab: where the remote database lives, which user owns
//! the saved mixtures, where the local cache file is, optional catalog files and the
//! AI advisor credentials.
//!
//! ## Sources (later wins)
//! 1. `LabConfig::default()`
//! 2. JSON config file (`lab_config.json` by default). A missing or unreadable file
//!    leaves the defaults in place.
//! 3. Environment variables `LAB_*`
//!
//! ## Storage mode
//! Cloud mode is chosen iff both the database id and the mixtures collection id are
//! present and non-empty; otherwise mixtures live in the local cache only. The mode is
//! decided once, when the storage backend is built.
//!
//! ## Configuration Format
//! ```json
//! {
//!   "appwriteEndpoint": "https://cloud.appwrite.io/v1",
//!   "appwriteProjectId": "virtual-lab",
//!   "databaseId": "lab",
//!   "mixturesCollectionId": "mixtures",
//!   "userId": "student-42",
//!   "localStorePath": "virtual_lab_storage.json"
//! }
//! ```

use crate::Chemistry::mixture_resolver::BeakerSettings;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "lab_config.json";
pub const DEFAULT_LOCAL_STORE: &str = "virtual_lab_storage.json";
pub const DEFAULT_ENDPOINT: &str = "https://cloud.appwrite.io/v1";
pub const DEFAULT_AI_MODEL: &str = "gemini-1.5-flash";
pub const GUEST_USER: &str = "guest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Cloud,
    Local,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Cloud => "cloud",
            StorageMode::Local => "local",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabConfig {
    pub appwrite_endpoint: String,
    pub appwrite_project_id: String,
    pub appwrite_api_key: Option<String>,
    pub database_id: Option<String>,
    pub mixtures_collection_id: Option<String>,
    pub user_id: String,
    pub local_store_path: String,
    /// JSON catalog replacing the built-in chemicals
    pub chemicals_file: Option<String>,
    /// JSON rule table replacing the built-in reactions
    pub reactions_file: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub beaker: BeakerSettings,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            appwrite_endpoint: DEFAULT_ENDPOINT.to_string(),
            appwrite_project_id: String::new(),
            appwrite_api_key: None,
            database_id: None,
            mixtures_collection_id: None,
            user_id: GUEST_USER.to_string(),
            local_store_path: DEFAULT_LOCAL_STORE.to_string(),
            chemicals_file: None,
            reactions_file: None,
            ai_api_key: None,
            ai_model: DEFAULT_AI_MODEL.to_string(),
            beaker: BeakerSettings::default(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl LabConfig {
    /// Config file + process environment.
    pub fn load() -> Self {
        let mut config = Self::from_file_or_default(DEFAULT_CONFIG_FILE);
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Reads a JSON config file. If the file doesn't exist or is invalid, returns
    /// the default configuration.
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => {
                info!("Loaded configuration from '{}'", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file '{}': {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: LabConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Overrides fields from `LAB_*` variables. `lookup` is `std::env::var` in the
    /// binary and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LAB_APPWRITE_ENDPOINT") {
            self.appwrite_endpoint = v;
        }
        if let Some(v) = lookup("LAB_APPWRITE_PROJECT_ID") {
            self.appwrite_project_id = v;
        }
        if let Some(v) = lookup("LAB_APPWRITE_API_KEY") {
            self.appwrite_api_key = Some(v);
        }
        if let Some(v) = lookup("LAB_DATABASE_ID") {
            self.database_id = Some(v);
        }
        if let Some(v) = lookup("LAB_MIXTURES_COLLECTION_ID") {
            self.mixtures_collection_id = Some(v);
        }
        if let Some(v) = lookup("LAB_USER_ID") {
            self.user_id = v;
        }
        if let Some(v) = lookup("LAB_LOCAL_STORE") {
            self.local_store_path = v;
        }
        if let Some(v) = lookup("LAB_CHEMICALS_FILE") {
            self.chemicals_file = Some(v);
        }
        if let Some(v) = lookup("LAB_REACTIONS_FILE") {
            self.reactions_file = Some(v);
        }
        if let Some(v) = lookup("LAB_AI_API_KEY") {
            self.ai_api_key = Some(v);
        }
        if let Some(v) = lookup("LAB_AI_MODEL") {
            self.ai_model = v;
        }
    }

    pub fn database_id(&self) -> Option<&str> {
        non_empty(&self.database_id)
    }

    pub fn mixtures_collection_id(&self) -> Option<&str> {
        non_empty(&self.mixtures_collection_id)
    }

    pub fn ai_api_key(&self) -> Option<&str> {
        non_empty(&self.ai_api_key)
    }

    pub fn storage_mode(&self) -> StorageMode {
        match (self.database_id(), self.mixtures_collection_id()) {
            (Some(_), Some(_)) => StorageMode::Cloud,
            _ => StorageMode::Local,
        }
    }
}
