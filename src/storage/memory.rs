use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::{KeyValueStore, SessionStores, StorageError};

/// Process-local store. Values live as long as the store does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// One [`MemoryStore`] per session id, created on first use.
#[derive(Debug, Default)]
pub struct MemorySessions {
    sessions: Mutex<HashMap<String, Arc<MemoryStore>>>,
}

impl MemorySessions {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl SessionStores for MemorySessions {
    async fn open(&self, session_id: &str) -> Result<Arc<dyn KeyValueStore>, StorageError> {
        let mut sessions = self.sessions.lock().await;
        let store: Arc<MemoryStore> = sessions.entry(session_id.to_string()).or_default().clone();
        Ok(store)
    }
}
