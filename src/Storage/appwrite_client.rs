//! # Remote document database client
//!
//! ## Aim
//! Generic document CRUD against an Appwrite-style REST API: documents live in a
//! collection inside a database, both addressed by identifiers from the configuration,
//! and every document gets an opaque server-assigned `$id`.
//!
//! ## Main Data Structures and Logic
//! - `DocumentClient`: trait for the remote database (dependency injection, tests use
//!   an in-memory fake)
//! - `Query`: equality / ordering / limit / offset filters, sent as JSON strings in
//!   `queries[]` parameters
//! - `Document`: `$id`, `$createdAt` and the remaining attributes
//! - `AppwriteClient`: blocking `reqwest` implementation
//!
//! Non-2xx answers become `StorageError::Api` carrying the status and the server's
//! message. No retries, no timeouts beyond reqwest's defaults.

use super::backend::StorageError;
use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use url::Url;

/// Attribute holding the server-side creation time
pub const CREATED_AT: &str = "$createdAt";

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal(String, Value),
    OrderDesc(String),
    OrderAsc(String),
    Limit(usize),
    Offset(usize),
}

impl Query {
    pub fn equal<V: Into<Value>>(attribute: &str, value: V) -> Self {
        Query::Equal(attribute.to_string(), value.into())
    }

    pub fn order_desc(attribute: &str) -> Self {
        Query::OrderDesc(attribute.to_string())
    }

    pub fn order_asc(attribute: &str) -> Self {
        Query::OrderAsc(attribute.to_string())
    }

    pub fn limit(n: usize) -> Self {
        Query::Limit(n)
    }

    pub fn offset(n: usize) -> Self {
        Query::Offset(n)
    }

    /// JSON query string as understood by the REST API
    pub fn to_wire(&self) -> String {
        let value = match self {
            Query::Equal(attribute, value) => {
                json!({ "method": "equal", "attribute": attribute, "values": [value] })
            }
            Query::OrderDesc(attribute) => json!({ "method": "orderDesc", "attribute": attribute }),
            Query::OrderAsc(attribute) => json!({ "method": "orderAsc", "attribute": attribute }),
            Query::Limit(n) => json!({ "method": "limit", "values": [n] }),
            Query::Offset(n) => json!({ "method": "offset", "values": [n] }),
        };
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub total: u64,
    pub documents: Vec<Document>,
}

pub trait DocumentClient {
    fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        data: &Map<String, Value>,
    ) -> Result<Document, StorageError>;

    fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<Vec<Document>, StorageError>;

    fn delete_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> Result<(), StorageError>;
}

pub struct AppwriteClient {
    client: Client,
    endpoint: Url,
    project_id: String,
    api_key: Option<String>,
}

impl AppwriteClient {
    pub fn new(
        endpoint: &str,
        project_id: &str,
        api_key: Option<&str>,
    ) -> Result<Self, StorageError> {
        Self::with_client(Client::new(), endpoint, project_id, api_key)
    }

    pub fn with_client(
        client: Client,
        endpoint: &str,
        project_id: &str,
        api_key: Option<&str>,
    ) -> Result<Self, StorageError> {
        let endpoint = Url::parse(endpoint)?;
        if endpoint.cannot_be_a_base() {
            return Err(StorageError::Url(url::ParseError::RelativeUrlWithoutBase));
        }
        Ok(Self {
            client,
            endpoint,
            project_id: project_id.to_string(),
            api_key: api_key.map(str::to_string).filter(|k| !k.is_empty()),
        })
    }

    /// `{endpoint}/databases/{db}/collections/{col}/documents[/{id}]`
    pub fn documents_url(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: Option<&str>,
    ) -> Result<Url, StorageError> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StorageError::Url(url::ParseError::RelativeUrlWithoutBase))?;
            segments.pop_if_empty().extend([
                "databases",
                database_id,
                "collections",
                collection_id,
                "documents",
            ]);
            if let Some(id) = document_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn with_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("X-Appwrite-Project", &self.project_id);
        match &self.api_key {
            Some(key) => builder.header("X-Appwrite-Key", key),
            None => builder,
        }
    }

    fn check(response: Response) -> Result<Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        Err(StorageError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl DocumentClient for AppwriteClient {
    fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        data: &Map<String, Value>,
    ) -> Result<Document, StorageError> {
        let url = self.documents_url(database_id, collection_id, None)?;
        debug!("POST {}", url);
        let body = json!({ "documentId": "unique()", "data": data });
        let response = self
            .with_headers(self.client.post(url))
            .json(&body)
            .send()?;
        Ok(Self::check(response)?.json()?)
    }

    fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<Vec<Document>, StorageError> {
        let url = self.documents_url(database_id, collection_id, None)?;
        debug!("GET {} ({} queries)", url, queries.len());
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|q| ("queries[]", q.to_wire()))
            .collect();
        let response = self
            .with_headers(self.client.get(url))
            .query(&params)
            .send()?;
        let list: DocumentList = Self::check(response)?.json()?;
        Ok(list.documents)
    }

    fn delete_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> Result<(), StorageError> {
        let url = self.documents_url(database_id, collection_id, Some(document_id))?;
        debug!("DELETE {}", url);
        let response = self.with_headers(self.client.delete(url)).send()?;
        Self::check(response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_url() {
        let client = AppwriteClient::new("https://cloud.appwrite.io/v1", "lab", None).unwrap();
        assert_eq!(
            client.documents_url("db", "mixtures", None).unwrap().as_str(),
            "https://cloud.appwrite.io/v1/databases/db/collections/mixtures/documents"
        );
        assert_eq!(
            client
                .documents_url("db", "mixtures", Some("abc123"))
                .unwrap()
                .as_str(),
            "https://cloud.appwrite.io/v1/databases/db/collections/mixtures/documents/abc123"
        );
        // trailing slash on the endpoint
        let client = AppwriteClient::new("https://example.org/v1/", "lab", Some("")).unwrap();
        assert!(client.api_key.is_none());
        assert_eq!(
            client.documents_url("d", "c", None).unwrap().as_str(),
            "https://example.org/v1/databases/d/collections/c/documents"
        );
    }

    #[test]
    fn test_bad_endpoints() {
        assert!(matches!(
            AppwriteClient::new("cloud.appwrite.io", "lab", None),
            Err(StorageError::Url(_))
        ));
        assert!(matches!(
            AppwriteClient::new("mailto:lab@example.org", "lab", None),
            Err(StorageError::Url(_))
        ));
    }

    #[test]
    fn test_query_wire_format() {
        let eq: Value = serde_json::from_str(&Query::equal("userId", "u1").to_wire()).unwrap();
        assert_eq!(
            eq,
            json!({ "method": "equal", "attribute": "userId", "values": ["u1"] })
        );
        let order: Value = serde_json::from_str(&Query::order_desc(CREATED_AT).to_wire()).unwrap();
        assert_eq!(order, json!({ "method": "orderDesc", "attribute": "$createdAt" }));
        let limit: Value = serde_json::from_str(&Query::limit(10).to_wire()).unwrap();
        assert_eq!(limit, json!({ "method": "limit", "values": [10] }));
        let offset: Value = serde_json::from_str(&Query::offset(3).to_wire()).unwrap();
        assert_eq!(offset, json!({ "method": "offset", "values": [3] }));
        assert_eq!(Query::order_asc("name"), Query::OrderAsc("name".to_string()));
    }

    #[test]
    fn test_document_deserialization() {
        let raw = r#"{
            "total": 1,
            "documents": [{
                "$id": "doc1",
                "$createdAt": "2024-05-01T10:00:00.000+00:00",
                "$collectionId": "mixtures",
                "name": "Water",
                "userId": "u1"
            }]
        }"#;
        let list: DocumentList = serde_json::from_str(raw).unwrap();
        assert_eq!(list.total, 1);
        let doc = &list.documents[0];
        assert_eq!(doc.id, "doc1");
        assert_eq!(doc.created_at.as_deref(), Some("2024-05-01T10:00:00.000+00:00"));
        assert_eq!(doc.data["name"], "Water");
        assert!(!doc.data.contains_key("$id"));
    }
}
