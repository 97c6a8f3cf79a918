//! Store trait definition

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};

/// String-keyed document store for cached capabilities
///
/// Values are serialized JSON. Implementations must make `set_item` atomic
/// per key: a concurrent or interrupted write never leaves a half-written
/// value visible to `get_item`.
#[async_trait]
pub trait CapabilityStore: Send + Sync {
    /// Fetch a value, `None` if absent
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Insert or replace a value (last write wins)
    async fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a value
    ///
    /// Returns `Ok(())` even if the key didn't exist (idempotent).
    async fn remove_item(&self, key: &str) -> StoreResult<()>;

    /// All keys currently stored, in no particular order
    async fn keys(&self) -> StoreResult<Vec<String>>;
}

pub(crate) fn check_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey("empty key".into()));
    }
    Ok(())
}
