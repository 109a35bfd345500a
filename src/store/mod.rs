//! Document-store collaborator.
//!
//! Everything the site persists (menus, monthly attachments, schedule rows,
//! contact leads) lives in named collections of JSON documents. Callers only
//! need keyed reads and writes, AND-combined equality queries, all-or-nothing
//! batches and a change feed, so that is all the trait exposes.

pub mod changes;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub use changes::{ChangeEvent, ChangeFeed, Subscription};
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// A stored document: its key within the collection and its JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Decodes the body into `T`, taking its `id` from the document key.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        let Document { id, mut data } = self;
        if let Value::Object(map) = &mut data {
            map.insert("id".into(), Value::String(id));
        }
        serde_json::from_value(data)
    }
}

/// Decodes every document, logging and skipping the malformed ones.
pub fn decode_all<T: DeserializeOwned>(collection: &str, docs: Vec<Document>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            doc.decode()
                .map_err(|e| tracing::warn!("Skipping malformed {} document {}: {}", collection, id, e))
                .ok()
        })
        .collect()
}

/// Stored body of `value`. The id is the document key, so it is not kept as a field.
pub fn document_body<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    let mut data = serde_json::to_value(value)?;
    if let Value::Object(map) = &mut data {
        map.remove("id");
    }
    Ok(data)
}

/// Equality predicate on a top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, data: &Value) -> bool {
        data.get(&self.field) == Some(&self.value)
    }
}

/// One write inside an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or replace the whole document.
    Set {
        collection: String,
        id: String,
        data: Value,
    },
    Delete {
        collection: String,
        id: String,
    },
}

impl WriteOp {
    pub fn set(collection: &str, id: impl Into<String>, data: Value) -> Self {
        WriteOp::Set {
            collection: collection.to_string(),
            id: id.into(),
            data,
        }
    }

    pub fn delete(collection: &str, id: impl Into<String>) -> Self {
        WriteOp::Delete {
            collection: collection.to_string(),
            id: id.into(),
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            WriteOp::Set { collection, .. } | WriteOp::Delete { collection, .. } => collection,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            WriteOp::Set { id, .. } | WriteOp::Delete { id, .. } => id,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Backend(String),
    #[error("write to {collection}/{id} rejected: {reason}")]
    Rejected {
        collection: String,
        id: String,
        reason: String,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// All documents of a collection, ordered by id.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Documents whose fields equal every filter value, ordered by id.
    async fn query_eq(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError>;

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        self.commit(vec![WriteOp::set(collection, id, data)]).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.commit(vec![WriteOp::delete(collection, id)]).await
    }

    /// Applies every write or none of them.
    async fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError>;

    /// Notified after each committed write touching `collection`.
    fn subscribe(&self, collection: &str) -> Subscription;
}
