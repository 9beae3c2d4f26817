use std::{env, sync::LazyLock};

use crate::storage::{DB_TABLE_PREFIX, data_store_from_env};
use crate::userdb::errors::UserError;

use super::memory::InMemoryAccountStore;
use super::store_type::{AccountStore, SqlAccountStore};

/// Users table name
pub(super) static DB_TABLE_USERS: LazyLock<String> = LazyLock::new(|| {
    env::var("DB_TABLE_USERS").unwrap_or_else(|_| format!("{}{}", *DB_TABLE_PREFIX, "users"))
});

/// Identity links table name
pub(super) static DB_TABLE_OAUTH2_LINKS: LazyLock<String> = LazyLock::new(|| {
    env::var("DB_TABLE_OAUTH2_LINKS")
        .unwrap_or_else(|_| format!("{}{}", *DB_TABLE_PREFIX, "oauth2_links"))
});

/// Builds the account store selected by `GENERIC_DATA_STORE_TYPE`
/// (`memory`, `sqlite` or `postgres`) and creates its tables.
pub async fn account_store_from_env() -> Result<Box<dyn AccountStore>, UserError> {
    let store_type = env::var("GENERIC_DATA_STORE_TYPE").unwrap_or_else(|_| "memory".to_string());

    let store: Box<dyn AccountStore> = match store_type.as_str() {
        "memory" => {
            tracing::warn!("Using in-memory account store; accounts are lost on restart");
            Box::new(InMemoryAccountStore::new())
        }
        t => {
            let url = env::var("GENERIC_DATA_STORE_URL").map_err(|_| {
                UserError::Storage("GENERIC_DATA_STORE_URL must be set".to_string())
            })?;
            Box::new(SqlAccountStore::new(data_store_from_env(t, &url)?))
        }
    };

    store.init().await?;
    Ok(store)
}
