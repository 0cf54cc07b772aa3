use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;

use super::{KeyValueStore, SessionStores, StorageError};

/// Session-scoped rows in `storefront_kv`.
#[derive(Debug, Clone)]
pub struct PgStore {
    db: PgPool,
    session_id: String,
}

impl PgStore {
    pub fn new(db: PgPool, session_id: impl Into<String>) -> Self {
        Self { db, session_id: session_id.into() }
    }
}

#[async_trait]
impl KeyValueStore for PgStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let row: Option<(Value,)> = sqlx::query_as("SELECT value FROM storefront_kv WHERE session_id = $1 AND key = $2")
            .bind(&self.session_id).bind(key).fetch_optional(&self.db).await?;
        Ok(row.map(|(v,)| v))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO storefront_kv (session_id, key, value, updated_at) VALUES ($1, $2, $3, NOW()) ON CONFLICT (session_id, key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()")
            .bind(&self.session_id).bind(key).bind(&value).execute(&self.db).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM storefront_kv WHERE session_id = $1 AND key = $2")
            .bind(&self.session_id).bind(key).execute(&self.db).await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PgSessions {
    db: PgPool,
}

impl PgSessions {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

#[async_trait]
impl SessionStores for PgSessions {
    async fn open(&self, session_id: &str) -> Result<Arc<dyn KeyValueStore>, StorageError> {
        Ok(Arc::new(PgStore::new(self.db.clone(), session_id)))
    }
}
