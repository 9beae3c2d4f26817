use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::storage::{CacheData, CacheStore};

use super::errors::SessionError;
use super::types::SessionKey;

/// Server-side per-session key-value storage keyed by an opaque session id.
///
/// Handlers sharing a session run concurrently; `take` is the single-use
/// primitive and must hand a value to at most one caller.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn get(&self, session_id: &str, key: SessionKey) -> Result<Option<String>, SessionError>;

    async fn set(&self, session_id: &str, key: SessionKey, value: &str)
    -> Result<(), SessionError>;

    /// Stores `value` unless the key already holds one. Returns the value now in effect.
    async fn set_if_absent(
        &self,
        session_id: &str,
        key: SessionKey,
        value: &str,
    ) -> Result<String, SessionError>;

    /// Removes the value and returns it.
    async fn take(&self, session_id: &str, key: SessionKey)
    -> Result<Option<String>, SessionError>;

    /// Removes every key of the session.
    async fn clear(&self, session_id: &str) -> Result<(), SessionError>;
}

/// [`SessionStore`] on top of a generic [`CacheStore`]; every key expires
/// after the session lifetime.
pub struct CacheSessionStore {
    cache: Arc<Mutex<Box<dyn CacheStore>>>,
    ttl: usize,
}

impl CacheSessionStore {
    pub fn new(cache: Box<dyn CacheStore>, ttl: u64) -> Self {
        Self {
            cache: Arc::new(Mutex::new(cache)),
            ttl: ttl as usize,
        }
    }
}

const ALL_KEYS: [SessionKey; 2] = [SessionKey::UserId, SessionKey::StateValidation];

#[async_trait]
impl SessionStore for CacheSessionStore {
    async fn get(&self, session_id: &str, key: SessionKey) -> Result<Option<String>, SessionError> {
        let data = self.cache.lock().await.get(key.prefix(), session_id).await?;
        Ok(data.map(|d| d.value))
    }

    async fn set(
        &self,
        session_id: &str,
        key: SessionKey,
        value: &str,
    ) -> Result<(), SessionError> {
        self.cache
            .lock()
            .await
            .put_with_ttl(key.prefix(), session_id, CacheData::from(value), self.ttl)
            .await?;
        Ok(())
    }

    async fn set_if_absent(
        &self,
        session_id: &str,
        key: SessionKey,
        value: &str,
    ) -> Result<String, SessionError> {
        let mut cache = self.cache.lock().await;
        if cache
            .put_if_not_exists(key.prefix(), session_id, CacheData::from(value), self.ttl)
            .await?
        {
            return Ok(value.to_string());
        }

        match cache.get(key.prefix(), session_id).await? {
            Some(existing) => Ok(existing.value),
            None => {
                // Expired between the two calls
                cache
                    .put_with_ttl(key.prefix(), session_id, CacheData::from(value), self.ttl)
                    .await?;
                Ok(value.to_string())
            }
        }
    }

    async fn take(
        &self,
        session_id: &str,
        key: SessionKey,
    ) -> Result<Option<String>, SessionError> {
        let data = self
            .cache
            .lock()
            .await
            .take(key.prefix(), session_id)
            .await?;
        Ok(data.map(|d| d.value))
    }

    async fn clear(&self, session_id: &str) -> Result<(), SessionError> {
        let mut cache = self.cache.lock().await;
        for key in ALL_KEYS {
            cache.remove(key.prefix(), session_id).await?;
        }
        Ok(())
    }
}
