use std::sync::Arc;

use axum::{extract::Path, Extension, Json};
use lesson_core::{Lesson, LessonCatalog, LessonSummary};

use crate::error::AppError;

pub async fn list_lessons(
    Extension(catalog): Extension<Arc<LessonCatalog>>,
) -> Json<Vec<LessonSummary>> {
    Json(catalog.summaries())
}

pub async fn get_lesson(
    Extension(catalog): Extension<Arc<LessonCatalog>>,
    Path(lesson_id): Path<String>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = catalog
        .get(&lesson_id)
        .ok_or(AppError::NotFound("Lesson not found".into()))?;
    Ok(Json(Lesson::clone(&lesson)))
}
