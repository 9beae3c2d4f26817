mod errors;
mod storage;
mod types;

pub use errors::UserError;
pub use storage::{AccountStore, InMemoryAccountStore, SqlAccountStore, account_store_from_env};
pub use types::{IdentityLink, OAuthLinks, User, group_links};
