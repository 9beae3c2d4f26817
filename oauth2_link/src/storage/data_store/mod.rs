mod config;
mod types;

pub(crate) use config::DB_TABLE_PREFIX;
pub use config::data_store_from_env;
pub use types::{DataStore, PostgresDataStore, SqliteDataStore};
