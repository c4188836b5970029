use std::sync::Arc;

use axum::{Extension, Json};
use chrono::Utc;
use lesson_core::{ExerciseCompleted, Lesson, LessonCatalog};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::middleware::AuthUser;
use crate::db::progress::{self, LessonProgress};
use crate::error::AppError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartLessonRequest {
    pub lesson_id: String,
}

pub fn lookup_lesson(catalog: &LessonCatalog, lesson_id: &str) -> Result<Arc<Lesson>, AppError> {
    catalog
        .get(lesson_id)
        .ok_or(AppError::NotFound("Lesson not found".into()))
}

/// The event must name an exercise of the lesson at its actual position.
pub fn check_completion(lesson: &Lesson, event: &ExerciseCompleted) -> Result<(), AppError> {
    match lesson.exercise_index(&event.exercise_id) {
        None => Err(AppError::NotFound("Exercise not found".into())),
        Some(i) if i != event.exercise_index => Err(AppError::BadRequest(format!(
            "exerciseIndex {} does not match exercise {}",
            event.exercise_index, event.exercise_id
        ))),
        Some(_) => Ok(()),
    }
}

pub async fn start_lesson(
    Extension(pool): Extension<PgPool>,
    Extension(catalog): Extension<Arc<LessonCatalog>>,
    user: AuthUser,
    Json(req): Json<StartLessonRequest>,
) -> Result<Json<LessonProgress>, AppError> {
    let lesson = lookup_lesson(&catalog, &req.lesson_id)?;
    let row = progress::ensure_in_progress(&pool, user.id, &lesson.lesson_id, Utc::now()).await?;
    Ok(Json(row))
}

pub async fn record_exercise(
    Extension(pool): Extension<PgPool>,
    Extension(catalog): Extension<Arc<LessonCatalog>>,
    user: AuthUser,
    Json(event): Json<ExerciseCompleted>,
) -> Result<Json<LessonProgress>, AppError> {
    let lesson = lookup_lesson(&catalog, &event.lesson_id)?;
    check_completion(&lesson, &event)?;

    let row = progress::apply_completion(&pool, user.id, &lesson, &event).await?;
    tracing::info!(
        user_id = user.id,
        lesson_id = %event.lesson_id,
        exercise_id = %event.exercise_id,
        status = %row.status,
        "Exercise completion recorded"
    );
    Ok(Json(row))
}
