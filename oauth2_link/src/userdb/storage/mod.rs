mod config;
mod memory;
mod postgres;
mod sqlite;
mod store_type;

pub use config::account_store_from_env;
pub use memory::InMemoryAccountStore;
pub use store_type::{AccountStore, SqlAccountStore};
