use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::auth::google::VerifiedGoogleIdentity;
use crate::error::AppError;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(skip_serializing)]
    pub google_sub: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

const USER_COLUMNS: &str =
    "id, google_sub, email, display_name, photo_url, role, created_at, last_login_at";

/// Create the user on first login, refresh profile fields on later ones.
pub async fn upsert_from_google_identity(
    pool: &PgPool,
    identity: &VerifiedGoogleIdentity,
    role: &str,
    now: DateTime<Utc>,
) -> Result<User, AppError> {
    let query = format!(
        r#"INSERT INTO users (google_sub, email, display_name, photo_url, role, last_login_at)
           VALUES ($1, $2, $3, $4, $5, $6)
           ON CONFLICT (google_sub) DO UPDATE SET
               email = EXCLUDED.email,
               display_name = EXCLUDED.display_name,
               photo_url = EXCLUDED.photo_url,
               role = EXCLUDED.role,
               last_login_at = EXCLUDED.last_login_at
           RETURNING {USER_COLUMNS}"#
    );
    sqlx::query_as::<_, User>(&query)
        .bind(&identity.google_sub)
        .bind(&identity.email)
        .bind(&identity.display_name)
        .bind(&identity.photo_url)
        .bind(role)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Sqlx)
}

pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, AppError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)
}

pub async fn persist_refresh_token(
    pool: &PgPool,
    user_id: i64,
    refresh_token_hash: &str,
    created_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"UPDATE users SET
               refresh_token_hash = $1,
               refresh_token_created_at = $2,
               refresh_token_revoked_at = NULL
           WHERE id = $3"#,
    )
    .bind(refresh_token_hash)
    .bind(created_at)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(AppError::Sqlx)?;
    Ok(())
}

/// Look up the owner of a live (not revoked) refresh token.
/// Returns the user together with the token's creation time.
pub async fn find_by_refresh_token(
    pool: &PgPool,
    refresh_token_hash: &str,
) -> Result<Option<(User, DateTime<Utc>)>, AppError> {
    let query = format!(
        r#"SELECT {USER_COLUMNS}, refresh_token_created_at
           FROM users
           WHERE refresh_token_hash = $1
             AND refresh_token_revoked_at IS NULL
             AND refresh_token_created_at IS NOT NULL"#
    );
    let row: Option<RefreshRow> = sqlx::query_as(&query)
        .bind(refresh_token_hash)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)?;

    Ok(row.map(|r| (r.user, r.refresh_token_created_at)))
}

#[derive(sqlx::FromRow)]
struct RefreshRow {
    #[sqlx(flatten)]
    user: User,
    refresh_token_created_at: DateTime<Utc>,
}

pub async fn revoke_refresh_token(
    pool: &PgPool,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET refresh_token_revoked_at = $1 WHERE id = $2")
        .bind(now)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(())
}

/// Hard delete; progress rows cascade.
pub async fn delete_by_id(pool: &PgPool, user_id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(result.rows_affected() > 0)
}
