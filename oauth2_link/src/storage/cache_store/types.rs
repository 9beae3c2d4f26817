use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Instant;

use crate::storage::errors::StorageError;
use crate::storage::types::CacheData;

pub struct InMemoryCacheStore {
    pub(super) entry: HashMap<String, (CacheData, Option<Instant>)>,
}

pub struct RedisCacheStore {
    pub(super) client: redis::Client,
}

/// Key-value cache with per-entry TTL.
///
/// `put_if_not_exists` and `take` must be atomic with respect to other callers;
/// session state consumption relies on `take` returning the value to exactly one caller.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Initialize the store. This is called when the store is created.
    async fn init(&self) -> Result<(), StorageError>;

    /// Put a value into the store with a TTL in seconds.
    async fn put_with_ttl(
        &mut self,
        prefix: &str,
        key: &str,
        value: CacheData,
        ttl: usize,
    ) -> Result<(), StorageError>;

    /// Get a value from the store.
    async fn get(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError>;

    /// Remove a value from the store.
    async fn remove(&mut self, prefix: &str, key: &str) -> Result<(), StorageError>;

    /// Put a value only if the key is absent. Returns true if the value was stored.
    async fn put_if_not_exists(
        &mut self,
        prefix: &str,
        key: &str,
        value: CacheData,
        ttl: usize,
    ) -> Result<bool, StorageError>;

    /// Get a value and delete it in one step.
    async fn take(&mut self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError>;
}
