use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{ChangeFeed, Document, DocumentStore, Filter, StoreError, Subscription, WriteOp};

type Collections = HashMap<String, BTreeMap<String, Value>>;

/// Process-local store. Used when no database is configured and by tests,
/// which can make it reject particular documents or go offline entirely.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<Collections>,
    rejected: RwLock<HashSet<(String, String)>>,
    offline: AtomicBool,
    feed: ChangeFeed,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any batch writing `collection/id` is refused as a whole.
    pub async fn reject_writes_to(&self, collection: &str, id: &str) {
        self.rejected
            .write()
            .await
            .insert((collection.to_string(), id.to_string()));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.ensure_online()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.query_eq(collection, &[]).await
    }

    async fn query_eq(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError> {
        self.ensure_online()?;
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(_, data)| filters.iter().all(|f| f.matches(data)))
            .map(|(id, data)| Document {
                id: id.clone(),
                data: data.clone(),
            })
            .collect())
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        self.ensure_online()?;
        {
            let rejected = self.rejected.read().await;
            if let Some(op) = ops
                .iter()
                .find(|op| rejected.contains(&(op.collection().to_string(), op.id().to_string())))
            {
                return Err(StoreError::Rejected {
                    collection: op.collection().to_string(),
                    id: op.id().to_string(),
                    reason: "permission denied".into(),
                });
            }
        }

        let mut collections = self.collections.write().await;
        for op in &ops {
            match op {
                WriteOp::Set {
                    collection,
                    id,
                    data,
                } => {
                    collections
                        .entry(collection.clone())
                        .or_default()
                        .insert(id.clone(), data.clone());
                }
                WriteOp::Delete { collection, id } => {
                    if let Some(docs) = collections.get_mut(collection) {
                        docs.remove(id);
                    }
                }
            }
        }
        drop(collections);

        self.feed.publish(ops.iter().map(WriteOp::collection));
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        self.feed.subscribe(collection)
    }
}
