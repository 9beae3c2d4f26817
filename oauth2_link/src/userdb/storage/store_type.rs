use async_trait::async_trait;

use crate::storage::DataStore;
use crate::userdb::{
    errors::UserError,
    types::{IdentityLink, User},
};

use super::postgres::*;
use super::sqlite::*;

/// Persistent accounts and their identity links.
///
/// A `(provider, provider_user_id)` pair belongs to at most one account; the
/// store enforces this together with username uniqueness.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Create tables or other backing structures.
    async fn init(&self) -> Result<(), UserError>;

    async fn get_user(&self, id: &str) -> Result<Option<User>, UserError>;

    /// Overwrites an existing account. `NotFound` if it does not exist.
    async fn update_user(&self, user: &User) -> Result<User, UserError>;

    async fn find_user_by_link(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Option<User>, UserError>;

    /// Inserts `user` and, when given, `link` as one atomic unit.
    ///
    /// Fails with `UsernameTaken` or `LinkTaken` on the respective uniqueness
    /// violation; nothing is persisted on failure.
    async fn create_user_with_link(
        &self,
        user: User,
        link: Option<IdentityLink>,
    ) -> Result<User, UserError>;

    /// Inserts or overwrites the link keyed by `(provider, provider_user_id)`,
    /// re-pointing it to `link.user_id`.
    async fn upsert_link(&self, link: IdentityLink) -> Result<IdentityLink, UserError>;

    async fn get_links(&self, user_id: &str) -> Result<Vec<IdentityLink>, UserError>;

    /// Removes the link if it belongs to `user_id`. Returns whether a link was removed.
    async fn delete_link(
        &self,
        user_id: &str,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<bool, UserError>;
}

/// [`AccountStore`] over a SQLite or PostgreSQL pool.
pub struct SqlAccountStore {
    store: Box<dyn DataStore>,
}

impl SqlAccountStore {
    pub fn new(store: Box<dyn DataStore>) -> Self {
        Self { store }
    }
}

fn unsupported() -> UserError {
    UserError::Storage("Unsupported database type".to_string())
}

#[async_trait]
impl AccountStore for SqlAccountStore {
    async fn init(&self) -> Result<(), UserError> {
        match (self.store.as_sqlite(), self.store.as_postgres()) {
            (Some(pool), _) => create_tables_sqlite(pool).await,
            (_, Some(pool)) => create_tables_postgres(pool).await,
            _ => Err(unsupported()),
        }
    }

    #[tracing::instrument(skip(self), fields(user_id = %id))]
    async fn get_user(&self, id: &str) -> Result<Option<User>, UserError> {
        if let Some(pool) = self.store.as_sqlite() {
            get_user_sqlite(pool, id).await
        } else if let Some(pool) = self.store.as_postgres() {
            get_user_postgres(pool, id).await
        } else {
            Err(unsupported())
        }
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update_user(&self, user: &User) -> Result<User, UserError> {
        let result = if let Some(pool) = self.store.as_sqlite() {
            update_user_sqlite(pool, user).await
        } else if let Some(pool) = self.store.as_postgres() {
            update_user_postgres(pool, user).await
        } else {
            Err(unsupported())
        };

        if let Err(e) = &result {
            tracing::error!(error = %e, "User update failed");
        }
        result
    }

    #[tracing::instrument(skip(self))]
    async fn find_user_by_link(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Option<User>, UserError> {
        let result = if let Some(pool) = self.store.as_sqlite() {
            find_user_by_link_sqlite(pool, provider, provider_user_id).await
        } else if let Some(pool) = self.store.as_postgres() {
            find_user_by_link_postgres(pool, provider, provider_user_id).await
        } else {
            Err(unsupported())
        };

        if let Ok(found) = &result {
            tracing::debug!(found = found.is_some(), "Link lookup completed");
        }
        result
    }

    #[tracing::instrument(skip(self, user, link), fields(user_id = %user.id, username = %user.username))]
    async fn create_user_with_link(
        &self,
        user: User,
        link: Option<IdentityLink>,
    ) -> Result<User, UserError> {
        if let Some(pool) = self.store.as_sqlite() {
            create_user_with_link_sqlite(pool, user, link).await
        } else if let Some(pool) = self.store.as_postgres() {
            create_user_with_link_postgres(pool, user, link).await
        } else {
            Err(unsupported())
        }
    }

    #[tracing::instrument(skip(self, link), fields(provider = %link.provider, user_id = %link.user_id))]
    async fn upsert_link(&self, link: IdentityLink) -> Result<IdentityLink, UserError> {
        if let Some(pool) = self.store.as_sqlite() {
            upsert_link_sqlite(pool, link).await
        } else if let Some(pool) = self.store.as_postgres() {
            upsert_link_postgres(pool, link).await
        } else {
            Err(unsupported())
        }
    }

    #[tracing::instrument(skip(self))]
    async fn get_links(&self, user_id: &str) -> Result<Vec<IdentityLink>, UserError> {
        if let Some(pool) = self.store.as_sqlite() {
            get_links_sqlite(pool, user_id).await
        } else if let Some(pool) = self.store.as_postgres() {
            get_links_postgres(pool, user_id).await
        } else {
            Err(unsupported())
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete_link(
        &self,
        user_id: &str,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<bool, UserError> {
        if let Some(pool) = self.store.as_sqlite() {
            delete_link_sqlite(pool, user_id, provider, provider_user_id).await
        } else if let Some(pool) = self.store.as_postgres() {
            delete_link_postgres(pool, user_id, provider, provider_user_id).await
        } else {
            Err(unsupported())
        }
    }
}

/// Maps a failed insert or update to the uniqueness violation it represents.
pub(super) fn classify_write_error(
    err: sqlx::Error,
    user: &User,
    link: Option<&IdentityLink>,
) -> UserError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let detail = format!(
                "{} {}",
                db_err.message(),
                db_err.constraint().unwrap_or_default()
            );
            if detail.contains("username") {
                return UserError::UsernameTaken(user.username.clone());
            }
            if let Some(link) = link.filter(|_| detail.contains("provider")) {
                return UserError::LinkTaken {
                    provider: link.provider.clone(),
                    provider_user_id: link.provider_user_id.clone(),
                };
            }
        }
    }
    UserError::Storage(err.to_string())
}
