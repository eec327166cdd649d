//! # Cloud mode
//!
//! Mixtures are documents in the remote collection, tagged with the owner's user id
//! and `type = "mixture"`; the chemical list travels as a JSON string attribute.
//!
//! Error policy differs by direction:
//! - **reads** (`load`) never fail: on a remote error the local cache is returned
//! - **writes** (`save`, `delete`, `clear_all`) return remote errors to the caller and
//!   do not fall back to the cache
//!
//! Successful remote reads and saves refresh the local cache so that the read
//! fallback has something to show. `clear_all` empties the cache even when the
//! remote listing fails halfway.

use super::appwrite_client::{CREATED_AT, Document, DocumentClient, Query};
use super::backend::{MixtureBackend, StorageError};
use super::local_store::MixtureCache;
use super::mixture::{MAX_SAVED_MIXTURES, Mixture};
use crate::Chemistry::color::Rgb;
use crate::settings::StorageMode;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Value of the `type` attribute of mixture documents
pub const MIXTURE_TYPE: &str = "mixture";
/// Page size when listing documents for deletion
const CLEAR_BATCH: usize = 100;

/// Attributes of a mixture document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MixtureRecord {
    user_id: String,
    #[serde(rename = "type")]
    kind: String,
    name: String,
    /// serialized `Vec<Chemical>`
    chemicals: String,
    color: Rgb,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

pub struct CloudBackend {
    client: Box<dyn DocumentClient>,
    database_id: String,
    collection_id: String,
    user_id: String,
    cache: MixtureCache,
}

impl CloudBackend {
    pub fn new(
        client: Box<dyn DocumentClient>,
        database_id: &str,
        collection_id: &str,
        user_id: &str,
        cache: MixtureCache,
    ) -> Self {
        Self {
            client,
            database_id: database_id.to_string(),
            collection_id: collection_id.to_string(),
            user_id: user_id.to_string(),
            cache,
        }
    }

    fn owner_queries(&self) -> Vec<Query> {
        vec![
            Query::equal("userId", self.user_id.as_str()),
            Query::equal("type", MIXTURE_TYPE),
        ]
    }

    fn to_document_data(&self, mixture: &Mixture) -> Result<Map<String, Value>, StorageError> {
        let record = MixtureRecord {
            user_id: self.user_id.clone(),
            kind: MIXTURE_TYPE.to_string(),
            name: mixture.name.clone(),
            chemicals: serde_json::to_string(&mixture.chemicals)?,
            color: mixture.color,
            created_at: Some(mixture.created_at),
        };
        match serde_json::to_value(record)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    /// Mixture from a remote document; the document id becomes the mixture id.
    pub fn from_document(document: &Document) -> Result<Mixture, StorageError> {
        let record: MixtureRecord = serde_json::from_value(Value::Object(document.data.clone()))?;
        let chemicals: Vec<_> = serde_json::from_str(&record.chemicals)?;
        if chemicals.is_empty() {
            return Err(StorageError::EmptyMixture);
        }
        let created_at = record
            .created_at
            .or_else(|| {
                document
                    .created_at
                    .as_deref()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|d| d.with_timezone(&Utc))
            })
            .unwrap_or_else(Utc::now);
        Ok(Mixture {
            id: document.id.clone(),
            name: record.name,
            chemicals,
            color: record.color,
            created_at,
        })
    }

    fn clear_cache(&mut self) {
        if let Err(e) = self.cache.clear() {
            warn!("Could not clear local mixture cache: {}", e);
        }
    }

    fn refresh_cache(&mut self, list: &[Mixture]) {
        if let Err(e) = self.cache.write(list) {
            warn!("Could not refresh local mixture cache: {}", e);
        }
    }
}

impl MixtureBackend for CloudBackend {
    fn mode(&self) -> StorageMode {
        StorageMode::Cloud
    }

    fn save(&mut self, mixture: &Mixture) -> Result<Mixture, StorageError> {
        let data = self.to_document_data(mixture)?;
        let document = self
            .client
            .create_document(&self.database_id, &self.collection_id, &data)?;
        let stored = Self::from_document(&document).unwrap_or_else(|e| {
            warn!("Saved document '{}' did not parse back: {}", document.id, e);
            Mixture {
                id: document.id.clone(),
                ..mixture.clone()
            }
        });
        info!("Saved mixture '{}' as document '{}'", stored.name, stored.id);
        if let Err(e) = self.cache.prepend(stored.clone()) {
            warn!("Could not cache saved mixture: {}", e);
        }
        Ok(stored)
    }

    fn load(&mut self) -> Vec<Mixture> {
        let mut queries = self.owner_queries();
        queries.push(Query::order_desc(CREATED_AT));
        queries.push(Query::limit(MAX_SAVED_MIXTURES));
        match self
            .client
            .list_documents(&self.database_id, &self.collection_id, &queries)
        {
            Ok(documents) => {
                let list: Vec<Mixture> = documents
                    .iter()
                    .filter_map(|doc| match Self::from_document(doc) {
                        Ok(mixture) => Some(mixture),
                        Err(e) => {
                            warn!("Skipping malformed mixture document '{}': {}", doc.id, e);
                            None
                        }
                    })
                    .take(MAX_SAVED_MIXTURES)
                    .collect();
                self.refresh_cache(&list);
                list
            }
            Err(e) => {
                warn!("Loading mixtures from the cloud failed, using local cache: {}", e);
                self.cache.read()
            }
        }
    }

    fn delete(&mut self, id: &str) -> Result<(), StorageError> {
        match self
            .client
            .delete_document(&self.database_id, &self.collection_id, id)
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => debug!("Mixture document '{}' already gone", id),
            Err(e) => return Err(e),
        }
        if let Err(e) = self.cache.remove(id) {
            warn!("Could not update local mixture cache: {}", e);
        }
        Ok(())
    }

    fn clear_all(&mut self) -> Result<usize, StorageError> {
        let mut removed = 0;
        // documents that refused to go stay at the head of the listing
        let mut skipped = 0;
        loop {
            let mut queries = self.owner_queries();
            queries.push(Query::order_asc(CREATED_AT));
            queries.push(Query::limit(CLEAR_BATCH));
            queries.push(Query::offset(skipped));
            let batch = match self
                .client
                .list_documents(&self.database_id, &self.collection_id, &queries)
            {
                Ok(batch) => batch,
                Err(e) => {
                    error!("Listing mixtures stopped after removing {}: {}", removed, e);
                    self.clear_cache();
                    return Err(e);
                }
            };
            if batch.is_empty() {
                break;
            }
            for document in &batch {
                match self
                    .client
                    .delete_document(&self.database_id, &self.collection_id, &document.id)
                {
                    Ok(()) => removed += 1,
                    Err(e) if e.is_not_found() => {}
                    Err(e) => {
                        error!("Failed to delete mixture document '{}': {}", document.id, e);
                        skipped += 1;
                    }
                }
            }
        }
        self.clear_cache();
        info!("Removed {} mixtures from the cloud, {} could not be deleted", removed, skipped);
        Ok(removed)
    }
}
