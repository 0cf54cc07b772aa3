//! Key-value persistence behind the cart, checkout and order services.
//!
//! Each storefront session gets its own [`KeyValueStore`]; the services only ever see JSON values
//! under the well-known keys below, so a backend can be swapped without touching them.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

mod memory;
mod postgres;

pub use memory::{MemorySessions, MemoryStore};
pub use postgres::{PgSessions, PgStore};

pub const CART_KEY: &str = "cart";
pub const DISCOUNT_KEY: &str = "appliedDiscount";
pub const CHECKOUT_ADDRESS_KEY: &str = "checkoutAddress";
pub const ORDERS_KEY: &str = "orders";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Hands out the store belonging to a session id.
#[async_trait]
pub trait SessionStores: Send + Sync {
    async fn open(&self, session_id: &str) -> Result<Arc<dyn KeyValueStore>, StorageError>;
}

/// Reads and decodes `key`.
///
/// Missing keys and values that no longer decode both come back as `None`; the latter is logged,
/// since stale shapes from older clients are expected.
pub async fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key).await? else { return Ok(None) };
    match serde_json::from_value(raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring malformed stored value");
            Ok(None)
        }
    }
}

pub async fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    store.set(key, serde_json::to_value(value)?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_load_json_missing_and_malformed() {
        let store = MemoryStore::new();
        let missing: Option<Vec<u32>> = load_json(&store, CART_KEY).await.unwrap();
        assert!(missing.is_none());

        store.set(CART_KEY, json!({"not": "a list"})).await.unwrap();
        let malformed: Option<Vec<u32>> = load_json(&store, CART_KEY).await.unwrap();
        assert!(malformed.is_none());

        save_json(&store, CART_KEY, &vec![1u32, 2]).await.unwrap();
        let loaded: Option<Vec<u32>> = load_json(&store, CART_KEY).await.unwrap();
        assert_eq!(loaded, Some(vec![1, 2]));
    }
}
