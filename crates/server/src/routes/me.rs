use axum::{http::StatusCode, Extension, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::auth::middleware::AuthUser;
use crate::db::{progress, progress::LessonProgress, users, users::User};
use crate::error::AppError;
use crate::sessions::SessionStore;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub completed_count: i64,
    pub lessons: Vec<LessonProgress>,
}

pub async fn get_me(user: AuthUser) -> Json<User> {
    Json(user.0)
}

pub async fn delete_me(
    Extension(pool): Extension<PgPool>,
    Extension(sessions): Extension<SessionStore>,
    user: AuthUser,
) -> Result<StatusCode, AppError> {
    sessions.remove(user.id).await;
    if !users::delete_by_id(&pool, user.id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    tracing::info!(user_id = user.id, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_my_progress(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
) -> Result<Json<ProgressResponse>, AppError> {
    let lessons = progress::list_by_user(&pool, user.id).await?;
    let completed_count = progress::count_completed_lessons(&pool, user.id).await?;
    Ok(Json(ProgressResponse {
        completed_count,
        lessons,
    }))
}
