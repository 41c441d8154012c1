//! In-memory store for tests and local runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::{ResultStore, values_key};
use crate::error::StoreError;

/// HashMap-backed [`ResultStore`] with optional write-failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set_value` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Copy of all stored key/value pairs.
    pub async fn entries(&self) -> HashMap<String, String> {
        self.values.read().await.clone()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn set_value(&self, index: i64, value: u64) -> Result<(), StoreError> {
        let key = values_key(index);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write {
                key,
                reason: "write rejected".to_string(),
            });
        }
        self.values.write().await.insert(key, value.to_string());
        Ok(())
    }

    async fn get_value(&self, index: i64) -> Result<Option<String>, StoreError> {
        Ok(self.values.read().await.get(&values_key(index)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_overwrites() {
        let store = MemoryStore::new();
        store.set_value(5, 8).await.unwrap();
        store.set_value(5, 9).await.unwrap();
        assert_eq!(store.get_value(5).await.unwrap().as_deref(), Some("9"));
        assert_eq!(store.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = MemoryStore::new();
        assert!(store.get_value(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn injected_failure_leaves_previous_value() {
        let store = MemoryStore::new();
        store.set_value(4, 5).await.unwrap();
        store.set_fail_writes(true);

        let err = store.set_value(4, 6).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { ref key, .. } if key == "values.4"));
        assert_eq!(store.get_value(4).await.unwrap().as_deref(), Some("5"));
    }
}
