use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::userdb::{
    errors::UserError,
    types::{IdentityLink, LinkRow, User},
};

use super::config::{DB_TABLE_OAUTH2_LINKS, DB_TABLE_USERS};
use super::store_type::classify_write_error;

pub(super) async fn create_tables_sqlite(pool: &Pool<Sqlite>) -> Result<(), UserError> {
    let users = DB_TABLE_USERS.as_str();
    let links = DB_TABLE_OAUTH2_LINKS.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {users} (
            id TEXT PRIMARY KEY NOT NULL,
            username TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL,
            is_verified BOOLEAN NOT NULL DEFAULT false,
            has_usable_password BOOLEAN NOT NULL DEFAULT true,
            is_staff BOOLEAN NOT NULL DEFAULT false,
            is_superuser BOOLEAN NOT NULL DEFAULT false,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await
    .map_err(|e| UserError::Storage(e.to_string()))?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {links} (
            provider TEXT NOT NULL,
            provider_user_id TEXT NOT NULL,
            user_id TEXT NOT NULL REFERENCES {users}(id) ON DELETE CASCADE,
            access_info TEXT NOT NULL,
            user_info TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL,
            UNIQUE (provider, provider_user_id)
        )
        "#
    ))
    .execute(pool)
    .await
    .map_err(|e| UserError::Storage(e.to_string()))?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{links}_user_id ON {links}(user_id)"
    ))
    .execute(pool)
    .await
    .map_err(|e| UserError::Storage(e.to_string()))?;

    Ok(())
}

pub(super) async fn get_user_sqlite(
    pool: &Pool<Sqlite>,
    id: &str,
) -> Result<Option<User>, UserError> {
    let users = DB_TABLE_USERS.as_str();
    sqlx::query_as::<_, User>(&format!("SELECT * FROM {users} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| UserError::Storage(e.to_string()))
}

pub(super) async fn update_user_sqlite(pool: &Pool<Sqlite>, user: &User) -> Result<User, UserError> {
    let users = DB_TABLE_USERS.as_str();
    let mut updated = user.clone();
    updated.updated_at = Utc::now();

    let result = sqlx::query(&format!(
        r#"
        UPDATE {users} SET
            username = ?, first_name = ?, last_name = ?, email = ?,
            is_verified = ?, has_usable_password = ?, is_staff = ?, is_superuser = ?,
            updated_at = ?
        WHERE id = ?
        "#
    ))
    .bind(&updated.username)
    .bind(&updated.first_name)
    .bind(&updated.last_name)
    .bind(&updated.email)
    .bind(updated.is_verified)
    .bind(updated.has_usable_password)
    .bind(updated.is_staff)
    .bind(updated.is_superuser)
    .bind(updated.updated_at)
    .bind(&updated.id)
    .execute(pool)
    .await
    .map_err(|e| classify_write_error(e, &updated, None))?;

    if result.rows_affected() == 0 {
        return Err(UserError::NotFound);
    }
    Ok(updated)
}

pub(super) async fn find_user_by_link_sqlite(
    pool: &Pool<Sqlite>,
    provider: &str,
    provider_user_id: &str,
) -> Result<Option<User>, UserError> {
    let users = DB_TABLE_USERS.as_str();
    let links = DB_TABLE_OAUTH2_LINKS.as_str();
    sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT u.* FROM {users} u
        JOIN {links} l ON l.user_id = u.id
        WHERE l.provider = ? AND l.provider_user_id = ?
        "#
    ))
    .bind(provider)
    .bind(provider_user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| UserError::Storage(e.to_string()))
}

pub(super) async fn create_user_with_link_sqlite(
    pool: &Pool<Sqlite>,
    user: User,
    link: Option<IdentityLink>,
) -> Result<User, UserError> {
    let users = DB_TABLE_USERS.as_str();
    let links = DB_TABLE_OAUTH2_LINKS.as_str();

    // Dropping the transaction without commit rolls it back
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| UserError::Storage(e.to_string()))?;

    sqlx::query(&format!(
        r#"
        INSERT INTO {users} (id, username, first_name, last_name, email, is_verified,
            has_usable_password, is_staff, is_superuser, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#
    ))
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(user.is_verified)
    .bind(user.has_usable_password)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&mut *tx)
    .await
    .map_err(|e| classify_write_error(e, &user, link.as_ref()))?;

    if let Some(link) = &link {
        sqlx::query(&format!(
            r#"
            INSERT INTO {links} (provider, provider_user_id, user_id, access_info, user_info,
                created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#
        ))
        .bind(&link.provider)
        .bind(&link.provider_user_id)
        .bind(&user.id)
        .bind(link.access_info.to_string())
        .bind(link.user_info.to_string())
        .bind(link.created_at)
        .bind(link.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify_write_error(e, &user, Some(link)))?;
    }

    tx.commit()
        .await
        .map_err(|e| classify_write_error(e, &user, link.as_ref()))?;

    Ok(user)
}

pub(super) async fn upsert_link_sqlite(
    pool: &Pool<Sqlite>,
    link: IdentityLink,
) -> Result<IdentityLink, UserError> {
    let links = DB_TABLE_OAUTH2_LINKS.as_str();
    let now = Utc::now();

    sqlx::query(&format!(
        r#"
        INSERT INTO {links} (provider, provider_user_id, user_id, access_info, user_info,
            created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (provider, provider_user_id) DO UPDATE SET
            user_id = excluded.user_id,
            access_info = excluded.access_info,
            user_info = excluded.user_info,
            updated_at = excluded.updated_at
        "#
    ))
    .bind(&link.provider)
    .bind(&link.provider_user_id)
    .bind(&link.user_id)
    .bind(link.access_info.to_string())
    .bind(link.user_info.to_string())
    .bind(link.created_at)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| UserError::Storage(e.to_string()))?;

    let row = sqlx::query_as::<_, LinkRow>(&format!(
        "SELECT * FROM {links} WHERE provider = ? AND provider_user_id = ?"
    ))
    .bind(&link.provider)
    .bind(&link.provider_user_id)
    .fetch_one(pool)
    .await
    .map_err(|e| UserError::Storage(e.to_string()))?;

    row.try_into()
}

pub(super) async fn get_links_sqlite(
    pool: &Pool<Sqlite>,
    user_id: &str,
) -> Result<Vec<IdentityLink>, UserError> {
    let links = DB_TABLE_OAUTH2_LINKS.as_str();
    sqlx::query_as::<_, LinkRow>(&format!(
        "SELECT * FROM {links} WHERE user_id = ? ORDER BY provider, provider_user_id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| UserError::Storage(e.to_string()))?
    .into_iter()
    .map(IdentityLink::try_from)
    .collect()
}

pub(super) async fn delete_link_sqlite(
    pool: &Pool<Sqlite>,
    user_id: &str,
    provider: &str,
    provider_user_id: &str,
) -> Result<bool, UserError> {
    let links = DB_TABLE_OAUTH2_LINKS.as_str();
    let result = sqlx::query(&format!(
        "DELETE FROM {links} WHERE user_id = ? AND provider = ? AND provider_user_id = ?"
    ))
    .bind(user_id)
    .bind(provider)
    .bind(provider_user_id)
    .execute(pool)
    .await
    .map_err(|e| UserError::Storage(e.to_string()))?;

    Ok(result.rows_affected() > 0)
}
