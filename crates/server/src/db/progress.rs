use chrono::{DateTime, Utc};
use lesson_core::{ExerciseCompleted, Lesson};
use serde::Serialize;
use sqlx::PgPool;

pub const IN_PROGRESS: &str = "in_progress";
pub const COMPLETED: &str = "completed";

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub lesson_id: String,
    pub status: String,
    pub current_exercise_index: i32,
    pub last_played_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

const PROGRESS_COLUMNS: &str =
    "lesson_id, status, current_exercise_index, last_played_at, completed_at, created_at";

pub async fn list_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<LessonProgress>, sqlx::Error> {
    let query = format!(
        "SELECT {PROGRESS_COLUMNS} FROM lesson_progress WHERE user_id = $1 ORDER BY last_played_at DESC"
    );
    sqlx::query_as::<_, LessonProgress>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await
}

/// Create the row if missing. An existing row only has its timestamp bumped.
pub async fn ensure_in_progress(
    pool: &PgPool,
    user_id: i64,
    lesson_id: &str,
    now: DateTime<Utc>,
) -> Result<LessonProgress, sqlx::Error> {
    let query = format!(
        r#"INSERT INTO lesson_progress (user_id, lesson_id, status, current_exercise_index, last_played_at)
           VALUES ($1, $2, '{IN_PROGRESS}', 0, $3)
           ON CONFLICT (user_id, lesson_id) DO UPDATE SET
               last_played_at = EXCLUDED.last_played_at
           RETURNING {PROGRESS_COLUMNS}"#
    );
    sqlx::query_as::<_, LessonProgress>(&query)
        .bind(user_id)
        .bind(lesson_id)
        .bind(now)
        .fetch_one(pool)
        .await
}

fn touch_sql() -> String {
    format!(
        r#"INSERT INTO lesson_progress (user_id, lesson_id, status, current_exercise_index, last_played_at)
           VALUES ($1, $2, '{IN_PROGRESS}', $3, $4)
           ON CONFLICT (user_id, lesson_id) DO UPDATE SET
               current_exercise_index = EXCLUDED.current_exercise_index,
               last_played_at = EXCLUDED.last_played_at
           RETURNING {PROGRESS_COLUMNS}"#
    )
}

/// Move the resume pointer without touching `status`.
pub async fn touch(
    pool: &PgPool,
    user_id: i64,
    lesson_id: &str,
    current_exercise_index: i32,
    now: DateTime<Utc>,
) -> Result<LessonProgress, sqlx::Error> {
    sqlx::query_as::<_, LessonProgress>(&touch_sql())
        .bind(user_id)
        .bind(lesson_id)
        .bind(current_exercise_index)
        .bind(now)
        .fetch_one(pool)
        .await
}

pub async fn mark_completed(
    pool: &PgPool,
    user_id: i64,
    lesson_id: &str,
    current_exercise_index: i32,
    now: DateTime<Utc>,
) -> Result<LessonProgress, sqlx::Error> {
    let query = format!(
        r#"INSERT INTO lesson_progress
               (user_id, lesson_id, status, current_exercise_index, last_played_at, completed_at)
           VALUES ($1, $2, '{COMPLETED}', $3, $4, $4)
           ON CONFLICT (user_id, lesson_id) DO UPDATE SET
               status = '{COMPLETED}',
               current_exercise_index = EXCLUDED.current_exercise_index,
               last_played_at = EXCLUDED.last_played_at,
               completed_at = COALESCE(lesson_progress.completed_at, EXCLUDED.completed_at)
           RETURNING {PROGRESS_COLUMNS}"#
    );
    sqlx::query_as::<_, LessonProgress>(&query)
        .bind(user_id)
        .bind(lesson_id)
        .bind(current_exercise_index)
        .bind(now)
        .fetch_one(pool)
        .await
}

/// Upsert one completion. Repeats overwrite the earlier row.
pub async fn record_exercise_completion(
    pool: &PgPool,
    user_id: i64,
    event: &ExerciseCompleted,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO exercise_completions
               (user_id, lesson_id, exercise_id, exercise_index, completed_at)
           VALUES ($1, $2, $3, $4, $5)
           ON CONFLICT (user_id, lesson_id, exercise_id) DO UPDATE SET
               exercise_index = EXCLUDED.exercise_index,
               completed_at = EXCLUDED.completed_at"#,
    )
    .bind(user_id)
    .bind(&event.lesson_id)
    .bind(&event.exercise_id)
    .bind(event.exercise_index as i32)
    .bind(event.completed_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Completed exercises of `lesson_id` among `exercise_ids`.
/// Rows for exercises no longer in the lesson are ignored.
pub async fn count_completed_exercises(
    pool: &PgPool,
    user_id: i64,
    lesson_id: &str,
    exercise_ids: &[String],
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"SELECT COUNT(*) FROM exercise_completions
           WHERE user_id = $1 AND lesson_id = $2 AND exercise_id = ANY($3)"#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .bind(exercise_ids)
    .fetch_one(pool)
    .await
}

pub async fn count_completed_lessons(pool: &PgPool, user_id: i64) -> Result<i64, sqlx::Error> {
    let query =
        format!("SELECT COUNT(*) FROM lesson_progress WHERE user_id = $1 AND status = '{COMPLETED}'");
    sqlx::query_scalar::<_, i64>(&query)
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn get_status(
    pool: &PgPool,
    user_id: i64,
    lesson_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT status FROM lesson_progress WHERE user_id = $1 AND lesson_id = $2",
    )
    .bind(user_id)
    .bind(lesson_id)
    .fetch_optional(pool)
    .await
}

/// What a new completion does to the lesson row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollUp {
    pub status: &'static str,
    pub resume_at: usize,
}

/// Status and resume pointer after completing exercise `completed_index`,
/// with `done` of the lesson's `exercise_count` exercises now recorded.
/// A lesson already completed stays completed.
pub fn roll_up(
    previous_status: Option<&str>,
    done: usize,
    exercise_count: usize,
    completed_index: usize,
) -> RollUp {
    let completed = previous_status == Some(COMPLETED) || done >= exercise_count;
    RollUp {
        status: if completed { COMPLETED } else { IN_PROGRESS },
        resume_at: next_exercise_index(completed_index, exercise_count),
    }
}

/// Persist one completion and roll it up into the lesson row.
pub async fn apply_completion(
    pool: &PgPool,
    user_id: i64,
    lesson: &Lesson,
    event: &ExerciseCompleted,
) -> Result<LessonProgress, sqlx::Error> {
    record_exercise_completion(pool, user_id, event).await?;

    let exercise_ids: Vec<String> = lesson.exercises.iter().map(|e| e.id.clone()).collect();
    let done = count_completed_exercises(pool, user_id, &lesson.lesson_id, &exercise_ids).await?;
    let previous = get_status(pool, user_id, &lesson.lesson_id).await?;

    let next = roll_up(
        previous.as_deref(),
        done as usize,
        lesson.exercises.len(),
        event.exercise_index,
    );
    let resume_at = next.resume_at as i32;

    if next.status == COMPLETED {
        mark_completed(pool, user_id, &lesson.lesson_id, resume_at, event.completed_at).await
    } else {
        touch(pool, user_id, &lesson.lesson_id, resume_at, event.completed_at).await
    }
}

/// Resume pointer after finishing `completed_index`, clamped to the last exercise.
pub fn next_exercise_index(completed_index: usize, exercise_count: usize) -> usize {
    (completed_index + 1).min(exercise_count.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_exercise_index() {
        assert_eq!(next_exercise_index(0, 3), 1);
        assert_eq!(next_exercise_index(1, 3), 2);
        assert_eq!(next_exercise_index(2, 3), 2);
        assert_eq!(next_exercise_index(0, 1), 0);
    }

    #[test]
    fn test_partial_lesson_stays_in_progress() {
        assert_eq!(
            roll_up(None, 1, 3, 0),
            RollUp { status: IN_PROGRESS, resume_at: 1 }
        );
        assert_eq!(
            roll_up(Some(IN_PROGRESS), 2, 3, 1),
            RollUp { status: IN_PROGRESS, resume_at: 2 }
        );
    }

    #[test]
    fn test_last_exercise_completes_lesson() {
        assert_eq!(
            roll_up(Some(IN_PROGRESS), 3, 3, 2),
            RollUp { status: COMPLETED, resume_at: 2 }
        );
        // Exercises finished out of order still complete once all are recorded.
        assert_eq!(
            roll_up(Some(IN_PROGRESS), 3, 3, 0),
            RollUp { status: COMPLETED, resume_at: 1 }
        );
        assert_eq!(roll_up(None, 1, 1, 0).status, COMPLETED);
    }

    #[test]
    fn test_completed_lesson_is_never_downgraded() {
        // Replaying an early exercise after finishing the lesson.
        assert_eq!(
            roll_up(Some(COMPLETED), 3, 3, 0),
            RollUp { status: COMPLETED, resume_at: 1 }
        );
        // The lesson gained an exercise since it was completed.
        assert_eq!(roll_up(Some(COMPLETED), 3, 4, 1).status, COMPLETED);
    }

    #[test]
    fn test_touch_leaves_status_alone() {
        let sql = touch_sql();
        let (_, update) = sql.split_once("DO UPDATE SET").unwrap();
        let (assignments, _) = update.split_once("RETURNING").unwrap();
        assert!(!assignments.contains("status"));
        assert!(!assignments.contains("completed_at"));
    }
}
