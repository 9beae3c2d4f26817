use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::userdb::{
    errors::UserError,
    types::{IdentityLink, LinkRow, User},
};

use super::config::{DB_TABLE_OAUTH2_LINKS, DB_TABLE_USERS};
use super::store_type::classify_write_error;

pub(super) async fn create_tables_postgres(pool: &Pool<Postgres>) -> Result<(), UserError> {
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
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
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
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
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

pub(super) async fn get_user_postgres(
    pool: &Pool<Postgres>,
    id: &str,
) -> Result<Option<User>, UserError> {
    let users = DB_TABLE_USERS.as_str();
    sqlx::query_as::<_, User>(&format!("SELECT * FROM {users} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| UserError::Storage(e.to_string()))
}

pub(super) async fn update_user_postgres(pool: &Pool<Postgres>, user: &User) -> Result<User, UserError> {
    let users = DB_TABLE_USERS.as_str();
    let mut updated = user.clone();
    updated.updated_at = Utc::now();

    let result = sqlx::query(&format!(
        r#"
        UPDATE {users} SET
            username = $1, first_name = $2, last_name = $3, email = $4,
            is_verified = $5, has_usable_password = $6, is_staff = $7, is_superuser = $8,
            updated_at = $9
        WHERE id = $10
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

pub(super) async fn find_user_by_link_postgres(
    pool: &Pool<Postgres>,
    provider: &str,
    provider_user_id: &str,
) -> Result<Option<User>, UserError> {
    let users = DB_TABLE_USERS.as_str();
    let links = DB_TABLE_OAUTH2_LINKS.as_str();
    sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT u.* FROM {users} u
        JOIN {links} l ON l.user_id = u.id
        WHERE l.provider = $1 AND l.provider_user_id = $2
        "#
    ))
    .bind(provider)
    .bind(provider_user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| UserError::Storage(e.to_string()))
}

pub(super) async fn create_user_with_link_postgres(
    pool: &Pool<Postgres>,
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
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
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
            VALUES ($1, $2, $3, $4, $5, $6, $7)
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

pub(super) async fn upsert_link_postgres(
    pool: &Pool<Postgres>,
    link: IdentityLink,
) -> Result<IdentityLink, UserError> {
    let links = DB_TABLE_OAUTH2_LINKS.as_str();
    let now = Utc::now();

    sqlx::query(&format!(
        r#"
        INSERT INTO {links} (provider, provider_user_id, user_id, access_info, user_info,
            created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
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
        "SELECT * FROM {links} WHERE provider = $1 AND provider_user_id = $2"
    ))
    .bind(&link.provider)
    .bind(&link.provider_user_id)
    .fetch_one(pool)
    .await
    .map_err(|e| UserError::Storage(e.to_string()))?;

    row.try_into()
}

pub(super) async fn get_links_postgres(
    pool: &Pool<Postgres>,
    user_id: &str,
) -> Result<Vec<IdentityLink>, UserError> {
    let links = DB_TABLE_OAUTH2_LINKS.as_str();
    sqlx::query_as::<_, LinkRow>(&format!(
        "SELECT * FROM {links} WHERE user_id = $1 ORDER BY provider, provider_user_id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| UserError::Storage(e.to_string()))?
    .into_iter()
    .map(IdentityLink::try_from)
    .collect()
}

pub(super) async fn delete_link_postgres(
    pool: &Pool<Postgres>,
    user_id: &str,
    provider: &str,
    provider_user_id: &str,
) -> Result<bool, UserError> {
    let links = DB_TABLE_OAUTH2_LINKS.as_str();
    let result = sqlx::query(&format!(
        "DELETE FROM {links} WHERE user_id = $1 AND provider = $2 AND provider_user_id = $3"
    ))
    .bind(user_id)
    .bind(provider)
    .bind(provider_user_id)
    .execute(pool)
    .await
    .map_err(|e| UserError::Storage(e.to_string()))?;

    Ok(result.rows_affected() > 0)
}
