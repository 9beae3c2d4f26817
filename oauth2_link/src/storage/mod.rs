mod cache_store;
mod data_store;
mod errors;
mod types;

pub use cache_store::{CacheStore, InMemoryCacheStore, RedisCacheStore, cache_store_from_env};
pub use data_store::{DataStore, PostgresDataStore, SqliteDataStore, data_store_from_env};
pub(crate) use data_store::DB_TABLE_PREFIX;
pub use errors::StorageError;
pub use types::CacheData;
