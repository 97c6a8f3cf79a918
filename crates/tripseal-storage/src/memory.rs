//! In-memory capability store

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::traits::{CapabilityStore, check_key};

/// In-memory store for tests and single-process runs
///
/// Thread-safe via `RwLock`. Not persistent: data lost on drop.
#[derive(Default)]
pub struct InMemoryCapabilityStore {
    items: RwLock<HashMap<String, String>>,
}

impl InMemoryCapabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.items.write().unwrap().clear();
    }
}

#[async_trait]
impl CapabilityStore for InMemoryCapabilityStore {
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.read().unwrap().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        check_key(key)?;
        self.items
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.items.write().unwrap().remove(key);
        Ok(())
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.items.read().unwrap().keys().cloned().collect())
    }
}
