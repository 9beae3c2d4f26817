use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::collections::BTreeMap;

use super::errors::UserError;

/// Local account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct User {
    /// Unique user identifier
    pub id: String,
    /// Unique login name
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Whether the email address has been verified
    pub is_verified: bool,
    /// False for accounts that can only sign in through an identity provider
    pub has_usable_password: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            is_verified: false,
            has_usable_password: true,
            is_staff: false,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Association between one local account and one `(provider, provider_user_id)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityLink {
    pub provider: String,
    pub provider_user_id: String,
    pub user_id: String,
    /// Token endpoint response from the most recent login
    pub access_info: Value,
    /// Identity claims or profile document from the most recent login
    pub user_info: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IdentityLink {
    pub fn new(
        provider: impl Into<String>,
        provider_user_id: impl Into<String>,
        user_id: impl Into<String>,
        access_info: Value,
        user_info: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            provider: provider.into(),
            provider_user_id: provider_user_id.into(),
            user_id: user_id.into(),
            access_info,
            user_info,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An account's links grouped `provider -> provider_user_id -> link`.
pub type OAuthLinks = BTreeMap<String, BTreeMap<String, IdentityLink>>;

pub fn group_links(links: impl IntoIterator<Item = IdentityLink>) -> OAuthLinks {
    let mut grouped = OAuthLinks::new();
    for link in links {
        grouped
            .entry(link.provider.clone())
            .or_default()
            .insert(link.provider_user_id.clone(), link);
    }
    grouped
}

/// Database row of the links table; JSON columns are stored as text.
#[derive(Debug, FromRow)]
pub(super) struct LinkRow {
    pub(super) provider: String,
    pub(super) provider_user_id: String,
    pub(super) user_id: String,
    pub(super) access_info: String,
    pub(super) user_info: String,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
}

impl TryFrom<LinkRow> for IdentityLink {
    type Error = UserError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        Ok(Self {
            provider: row.provider,
            provider_user_id: row.provider_user_id,
            user_id: row.user_id,
            access_info: serde_json::from_str(&row.access_info)?,
            user_info: serde_json::from_str(&row.user_info)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
