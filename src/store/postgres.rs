use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};

use super::{ChangeFeed, Document, DocumentStore, Filter, StoreError, Subscription, WriteOp};

/// Documents kept in a single JSONB table keyed by (collection, id).
/// See `migrations/` for the schema.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    feed: ChangeFeed,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            feed: ChangeFeed::new(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn into_documents(rows: Vec<(String, Json<Value>)>) -> Vec<Document> {
    rows.into_iter()
        .map(|(id, Json(data))| Document { id, data })
        .collect()
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row: Option<(String, Json<Value>)> = sqlx::query_as(
            "SELECT id, data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, Json(data))| Document { id, data }))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.query_eq(collection, &[]).await
    }

    async fn query_eq(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, data FROM documents WHERE collection = ");
        qb.push_bind(collection);
        for filter in filters {
            qb.push(" AND data -> ")
                .push_bind(filter.field.clone())
                .push(" = ")
                .push_bind(Json(filter.value.clone()));
        }
        qb.push(" ORDER BY id");

        let rows: Vec<(String, Json<Value>)> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(into_documents(rows))
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for op in &ops {
            let result = match op {
                WriteOp::Set {
                    collection,
                    id,
                    data,
                } => {
                    sqlx::query(
                        r#"INSERT INTO documents (collection, id, data)
                           VALUES ($1, $2, $3)
                           ON CONFLICT (collection, id) DO UPDATE SET
                               data = EXCLUDED.data,
                               updated_at = NOW()"#,
                    )
                    .bind(collection)
                    .bind(id)
                    .bind(Json(data))
                    .execute(&mut *tx)
                    .await
                }
                WriteOp::Delete { collection, id } => {
                    sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                        .bind(collection)
                        .bind(id)
                        .execute(&mut *tx)
                        .await
                }
            };
            // Dropping `tx` on the error path rolls back every earlier write.
            result.map_err(|e| StoreError::Rejected {
                collection: op.collection().to_string(),
                id: op.id().to_string(),
                reason: e.to_string(),
            })?;
        }
        tx.commit().await?;

        self.feed.publish(ops.iter().map(WriteOp::collection));
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        self.feed.subscribe(collection)
    }
}
