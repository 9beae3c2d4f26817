use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::userdb::{
    errors::UserError,
    types::{IdentityLink, User},
};

use super::store_type::AccountStore;

#[derive(Default)]
struct Accounts {
    users: HashMap<String, User>,
    links: HashMap<(String, String), IdentityLink>,
}

impl Accounts {
    fn username_taken(&self, username: &str, except_id: &str) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && u.id != except_id)
    }
}

/// Process-local [`AccountStore`]; one mutex makes every operation atomic.
#[derive(Default)]
pub struct InMemoryAccountStore {
    inner: Mutex<Accounts>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn init(&self) -> Result<(), UserError> {
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, UserError> {
        Ok(self.inner.lock().await.users.get(id).cloned())
    }

    async fn update_user(&self, user: &User) -> Result<User, UserError> {
        let mut accounts = self.inner.lock().await;
        if !accounts.users.contains_key(&user.id) {
            return Err(UserError::NotFound);
        }
        if accounts.username_taken(&user.username, &user.id) {
            return Err(UserError::UsernameTaken(user.username.clone()));
        }

        let mut updated = user.clone();
        updated.updated_at = Utc::now();
        accounts.users.insert(updated.id.clone(), updated.clone());
        Ok(updated)
    }

    async fn find_user_by_link(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Option<User>, UserError> {
        let accounts = self.inner.lock().await;
        Ok(accounts
            .links
            .get(&(provider.to_string(), provider_user_id.to_string()))
            .and_then(|link| accounts.users.get(&link.user_id))
            .cloned())
    }

    async fn create_user_with_link(
        &self,
        user: User,
        link: Option<IdentityLink>,
    ) -> Result<User, UserError> {
        let mut accounts = self.inner.lock().await;
        if accounts.username_taken(&user.username, "") {
            return Err(UserError::UsernameTaken(user.username));
        }
        if accounts.users.contains_key(&user.id) {
            return Err(UserError::Storage(format!("Duplicate user id {}", user.id)));
        }

        if let Some(mut link) = link {
            let key = (link.provider.clone(), link.provider_user_id.clone());
            if accounts.links.contains_key(&key) {
                return Err(UserError::LinkTaken {
                    provider: link.provider,
                    provider_user_id: link.provider_user_id,
                });
            }
            link.user_id = user.id.clone();
            accounts.links.insert(key, link);
        }

        accounts.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn upsert_link(&self, link: IdentityLink) -> Result<IdentityLink, UserError> {
        let mut accounts = self.inner.lock().await;
        if !accounts.users.contains_key(&link.user_id) {
            return Err(UserError::NotFound);
        }

        let key = (link.provider.clone(), link.provider_user_id.clone());
        let mut stored = link;
        stored.updated_at = Utc::now();
        if let Some(existing) = accounts.links.get(&key) {
            stored.created_at = existing.created_at;
        }
        accounts.links.insert(key, stored.clone());
        Ok(stored)
    }

    async fn get_links(&self, user_id: &str) -> Result<Vec<IdentityLink>, UserError> {
        let accounts = self.inner.lock().await;
        let mut links: Vec<_> = accounts
            .links
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        links.sort_by(|a, b| {
            (&a.provider, &a.provider_user_id).cmp(&(&b.provider, &b.provider_user_id))
        });
        Ok(links)
    }

    async fn delete_link(
        &self,
        user_id: &str,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<bool, UserError> {
        let mut accounts = self.inner.lock().await;
        let key = (provider.to_string(), provider_user_id.to_string());
        match accounts.links.get(&key) {
            Some(link) if link.user_id == user_id => {
                accounts.links.remove(&key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
