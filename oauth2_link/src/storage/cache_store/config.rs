use std::env;

use crate::storage::errors::StorageError;

use super::types::{CacheStore, InMemoryCacheStore, RedisCacheStore};

/// Builds the cache store selected by `GENERIC_CACHE_STORE_TYPE` (`memory` or `redis`).
///
/// `GENERIC_CACHE_STORE_URL` is required for `redis`.
pub async fn cache_store_from_env() -> Result<Box<dyn CacheStore>, StorageError> {
    let store_type = env::var("GENERIC_CACHE_STORE_TYPE").unwrap_or_else(|_| "memory".to_string());
    let store_url = env::var("GENERIC_CACHE_STORE_URL").unwrap_or_default();

    tracing::info!("Initializing cache store with type: {}", store_type);

    let store: Box<dyn CacheStore> = match store_type.as_str() {
        "memory" => Box::new(InMemoryCacheStore::new()),
        "redis" => {
            let client = redis::Client::open(store_url.as_str()).map_err(|e| {
                tracing::error!("Failed to create Redis client: {}", e);
                StorageError::Config(format!("Invalid GENERIC_CACHE_STORE_URL: {e}"))
            })?;
            Box::new(RedisCacheStore::new(client))
        }
        t => {
            return Err(StorageError::Config(format!(
                "Unsupported cache store type: {t}. Supported types are 'memory' and 'redis'"
            )));
        }
    };

    // Verify the backend is reachable before serving requests
    store.init().await?;

    tracing::info!("Connected to cache store: type={}", store_type);
    Ok(store)
}
