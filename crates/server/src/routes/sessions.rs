use std::sync::Arc;

use axum::{Extension, Json};
use chrono::Utc;
use lesson_core::runner::MoveResult;
use lesson_core::{BoardView, ExerciseCompleted, LessonCatalog, RecordingTracker, TrainingSession};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::middleware::AuthUser;
use crate::db::progress;
use crate::error::AppError;
use crate::routes::progress::lookup_lesson;
use crate::sessions::{FlushReport, SessionStore};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    pub lesson_id: String,
    /// Defaults to the stored resume point.
    pub exercise_index: Option<usize>,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    pub uci: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub result: MoveResult,
    pub message: String,
    pub view: BoardView,
    /// Completions that could not be saved yet; retried on the next call.
    pub pending_completions: usize,
}

fn no_session() -> AppError {
    AppError::NotFound("No active session".into())
}

pub async fn open_session(
    Extension(pool): Extension<PgPool>,
    Extension(catalog): Extension<Arc<LessonCatalog>>,
    Extension(sessions): Extension<SessionStore>,
    user: AuthUser,
    Json(req): Json<OpenSessionRequest>,
) -> Result<Json<BoardView>, AppError> {
    let lesson = lookup_lesson(&catalog, &req.lesson_id)?;
    let row = progress::ensure_in_progress(&pool, user.id, &lesson.lesson_id, Utc::now()).await?;
    let start_at = req
        .exercise_index
        .unwrap_or(row.current_exercise_index.max(0) as usize);

    let session: TrainingSession = TrainingSession::open_at(lesson, start_at)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let view = session.view();
    sessions.insert(user.id, session).await;
    save_completions(&sessions, &pool, &catalog, user.id).await;

    tracing::info!(
        user_id = user.id,
        lesson_id = %view.lesson_id,
        exercise = view.exercise_number,
        "Session opened"
    );
    Ok(Json(view))
}

pub async fn current_session(
    Extension(pool): Extension<PgPool>,
    Extension(catalog): Extension<Arc<LessonCatalog>>,
    Extension(sessions): Extension<SessionStore>,
    user: AuthUser,
) -> Result<Json<BoardView>, AppError> {
    let view = sessions
        .with_session(user.id, |s| s.view())
        .await
        .ok_or_else(no_session)?;
    save_completions(&sessions, &pool, &catalog, user.id).await;
    Ok(Json(view))
}

pub async fn submit_move(
    Extension(pool): Extension<PgPool>,
    Extension(catalog): Extension<Arc<LessonCatalog>>,
    Extension(sessions): Extension<SessionStore>,
    user: AuthUser,
    Json(req): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, AppError> {
    let mut tracker = RecordingTracker::new();
    let (outcome, view) = sessions
        .with_session(user.id, |s| {
            let outcome = s.submit_move(req.uci.trim(), &mut tracker);
            (outcome, s.view())
        })
        .await
        .ok_or_else(no_session)?;

    tracing::debug!(user_id = user.id, uci = %req.uci, outcome = %outcome, "Move submitted");

    // Lock released; queue first so a failed save is retried later.
    sessions.queue_completions(user.id, tracker.drain()).await;
    let report = save_completions(&sessions, &pool, &catalog, user.id).await;

    Ok(Json(MoveResponse {
        result: outcome.kind(),
        message: outcome.to_string(),
        view,
        pending_completions: report.pending,
    }))
}

/// Persist everything queued for `user_id`. Failures stay queued.
async fn save_completions(
    sessions: &SessionStore,
    pool: &PgPool,
    catalog: &Arc<LessonCatalog>,
    user_id: i64,
) -> FlushReport {
    sessions
        .flush_completions(user_id, |event| {
            persist_completion(pool.clone(), Arc::clone(catalog), user_id, event)
        })
        .await
}

async fn persist_completion(
    pool: PgPool,
    catalog: Arc<LessonCatalog>,
    user_id: i64,
    event: ExerciseCompleted,
) -> Result<(), AppError> {
    let lesson = lookup_lesson(&catalog, &event.lesson_id)?;
    let row = progress::apply_completion(&pool, user_id, &lesson, &event).await?;
    tracing::info!(
        user_id,
        lesson_id = %event.lesson_id,
        exercise_id = %event.exercise_id,
        status = %row.status,
        "Exercise completed"
    );
    Ok(())
}

pub async fn restart_exercise(
    Extension(pool): Extension<PgPool>,
    Extension(catalog): Extension<Arc<LessonCatalog>>,
    Extension(sessions): Extension<SessionStore>,
    user: AuthUser,
) -> Result<Json<BoardView>, AppError> {
    let view = sessions
        .with_session(user.id, |s| {
            s.restart();
            s.view()
        })
        .await
        .ok_or_else(no_session)?;
    save_completions(&sessions, &pool, &catalog, user.id).await;
    Ok(Json(view))
}

pub async fn next_exercise(
    Extension(pool): Extension<PgPool>,
    Extension(catalog): Extension<Arc<LessonCatalog>>,
    Extension(sessions): Extension<SessionStore>,
    user: AuthUser,
) -> Result<Json<BoardView>, AppError> {
    let view = sessions
        .with_session(user.id, |s| {
            s.next_exercise();
            s.view()
        })
        .await
        .ok_or_else(no_session)?;
    save_completions(&sessions, &pool, &catalog, user.id).await;
    Ok(Json(view))
}
