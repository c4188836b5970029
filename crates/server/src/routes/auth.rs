use axum::{http::StatusCode, Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{google::GoogleVerifier, jwt, middleware::AuthUser, tokens};
use crate::config::Config;
use crate::db::users::{self, User, ROLE_ADMIN, ROLE_USER};
use crate::error::AppError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub id_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

fn access_token(user_id: i64, email: &str, config: &Config) -> Result<String, AppError> {
    jwt::create_token(user_id, email, &config.jwt_secret, config.access_token_ttl_minutes)
        .map_err(|e| AppError::Internal(format!("Token error: {e}")))
}

pub async fn login(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Extension(google): Extension<GoogleVerifier>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if req.id_token.trim().is_empty() {
        return Err(AppError::BadRequest("idToken is required".into()));
    }

    let identity = google.verify_id_token(&req.id_token).await.map_err(|e| {
        tracing::warn!("Google login rejected: {e}");
        AppError::Unauthorized
    })?;

    let role = if config.is_admin(&identity.email) { ROLE_ADMIN } else { ROLE_USER };
    let now = Utc::now();
    let user = users::upsert_from_google_identity(&pool, &identity, role, now).await?;

    let refresh = tokens::issue_refresh_token(now);
    users::persist_refresh_token(&pool, user.id, &refresh.hash, refresh.created_at).await?;

    let access_token = access_token(user.id, &user.email, &config)?;
    tracing::info!(user_id = user.id, role = %user.role, "User logged in");

    Ok(Json(AuthResponse {
        user,
        access_token,
        refresh_token: refresh.token,
        token_type: "bearer",
        expires_in: config.access_token_ttl_minutes * 60,
    }))
}

pub async fn refresh(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let hash = tokens::hash_token(req.refresh_token.trim());
    let (user, created_at) = users::find_by_refresh_token(&pool, &hash)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if tokens::is_expired(created_at, config.refresh_token_ttl_days, Utc::now()) {
        return Err(AppError::Unauthorized);
    }

    Ok(Json(RefreshResponse {
        access_token: access_token(user.id, &user.email, &config)?,
        token_type: "bearer",
        expires_in: config.access_token_ttl_minutes * 60,
    }))
}

pub async fn logout(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
) -> Result<StatusCode, AppError> {
    users::revoke_refresh_token(&pool, user.id, Utc::now()).await?;
    tracing::info!(user_id = user.id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}
