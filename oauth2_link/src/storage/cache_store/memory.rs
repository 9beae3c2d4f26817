use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::storage::errors::StorageError;
use crate::storage::types::CacheData;

use super::types::{CacheStore, InMemoryCacheStore};

const CACHE_PREFIX: &str = "cache";

impl InMemoryCacheStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory generic cache store");
        Self {
            entry: HashMap::new(),
        }
    }

    fn make_key(prefix: &str, key: &str) -> String {
        format!("{CACHE_PREFIX}:{prefix}:{key}")
    }

    fn expiry(ttl: usize) -> Option<Instant> {
        (ttl > 0).then(|| Instant::now() + Duration::from_secs(ttl as u64))
    }

    /// Drops the entry if it has expired and returns whether a live entry remains.
    fn evict_if_expired(&mut self, key: &str) -> bool {
        match self.entry.get(key) {
            Some((_, Some(expires_at))) if *expires_at <= Instant::now() => {
                self.entry.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Drops every expired entry.
    fn sweep_expired(&mut self) {
        let now = Instant::now();
        self.entry
            .retain(|_, (_, expires_at)| expires_at.is_none_or(|t| t > now));
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn init(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn put_with_ttl(
        &mut self,
        prefix: &str,
        key: &str,
        value: CacheData,
        ttl: usize,
    ) -> Result<(), StorageError> {
        self.sweep_expired();
        let key = Self::make_key(prefix, key);
        self.entry.insert(key, (value, Self::expiry(ttl)));
        Ok(())
    }

    async fn get(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError> {
        let key = Self::make_key(prefix, key);
        Ok(self.entry.get(&key).and_then(|(value, expires_at)| {
            match expires_at {
                Some(t) if *t <= Instant::now() => None,
                _ => Some(value.clone()),
            }
        }))
    }

    async fn remove(&mut self, prefix: &str, key: &str) -> Result<(), StorageError> {
        let key = Self::make_key(prefix, key);
        self.entry.remove(&key);
        Ok(())
    }

    async fn put_if_not_exists(
        &mut self,
        prefix: &str,
        key: &str,
        value: CacheData,
        ttl: usize,
    ) -> Result<bool, StorageError> {
        self.sweep_expired();
        let key = Self::make_key(prefix, key);
        if self.evict_if_expired(&key) {
            return Ok(false);
        }
        self.entry.insert(key, (value, Self::expiry(ttl)));
        Ok(true)
    }

    async fn take(&mut self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError> {
        let key = Self::make_key(prefix, key);
        if !self.evict_if_expired(&key) {
            return Ok(None);
        }
        Ok(self.entry.remove(&key).map(|(value, _)| value))
    }
}
