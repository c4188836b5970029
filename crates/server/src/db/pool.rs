use sqlx::postgres::{PgPool, PgPoolOptions};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Run the full Postgres schema migration inline.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Users (Google identities)
CREATE TABLE IF NOT EXISTS users (
    id                       BIGSERIAL PRIMARY KEY,
    google_sub               TEXT UNIQUE NOT NULL,
    email                    TEXT NOT NULL,
    display_name             TEXT,
    photo_url                TEXT,
    role                     TEXT NOT NULL DEFAULT 'user',
    refresh_token_hash       TEXT,
    refresh_token_created_at TIMESTAMPTZ,
    refresh_token_revoked_at TIMESTAMPTZ,
    created_at               TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    last_login_at            TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_users_refresh_token_hash
    ON users (refresh_token_hash);

-- Per-lesson progress
CREATE TABLE IF NOT EXISTS lesson_progress (
    id                     BIGSERIAL PRIMARY KEY,
    user_id                BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    lesson_id              TEXT NOT NULL,
    status                 TEXT NOT NULL DEFAULT 'in_progress',
    current_exercise_index INTEGER NOT NULL DEFAULT 0,
    last_played_at         TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    completed_at           TIMESTAMPTZ,
    created_at             TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE(user_id, lesson_id)
);

CREATE INDEX IF NOT EXISTS idx_lesson_progress_user_id
    ON lesson_progress (user_id);

-- Completed exercises (last write wins)
CREATE TABLE IF NOT EXISTS exercise_completions (
    user_id        BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    lesson_id      TEXT NOT NULL,
    exercise_id    TEXT NOT NULL,
    exercise_index INTEGER NOT NULL,
    completed_at   TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (user_id, lesson_id, exercise_id)
);
"#;
