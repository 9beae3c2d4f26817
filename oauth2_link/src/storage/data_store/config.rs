//! Database connection configuration

use std::{env, str::FromStr, sync::LazyLock};

use crate::storage::errors::StorageError;

use super::types::{DataStore, PostgresDataStore, SqliteDataStore};

/// Table prefix from environment variable
pub(crate) static DB_TABLE_PREFIX: LazyLock<String> =
    LazyLock::new(|| env::var("DB_TABLE_PREFIX").unwrap_or_else(|_| "o2l_".to_string()));

/// Opens a lazily-connected pool for `store_type` (`sqlite` or `postgres`).
pub fn data_store_from_env(
    store_type: &str,
    store_url: &str,
) -> Result<Box<dyn DataStore>, StorageError> {
    tracing::info!("Initializing data store with type: {}", store_type);

    let store: Box<dyn DataStore> = match store_type {
        "sqlite" => {
            let opts = sqlx::sqlite::SqliteConnectOptions::from_str(store_url)
                .map_err(|e| StorageError::Config(format!("Invalid SQLite URL: {e}")))?
                .create_if_missing(true);
            Box::new(SqliteDataStore::new(
                sqlx::sqlite::SqlitePool::connect_lazy_with(opts),
            ))
        }
        "postgres" => Box::new(PostgresDataStore::new(
            sqlx::PgPool::connect_lazy(store_url)
                .map_err(|e| StorageError::Config(format!("Invalid Postgres URL: {e}")))?,
        )),
        t => {
            return Err(StorageError::Config(format!(
                "Unsupported store type: {t}. Supported types are 'sqlite' and 'postgres'"
            )));
        }
    };

    tracing::info!("Configured database pool: type={}", store_type);
    Ok(store)
}
