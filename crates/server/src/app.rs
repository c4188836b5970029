//! Router assembly. State travels as request extensions.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use lesson_core::{catalog::LoadReport, LessonCatalog};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::google::GoogleVerifier;
use crate::config::Config;
use crate::routes;
use crate::sessions::SessionStore;

pub struct AppContext {
    pub pool: PgPool,
    pub config: Config,
    pub catalog: Arc<LessonCatalog>,
    pub report: Arc<LoadReport>,
    pub google: GoogleVerifier,
    pub sessions: SessionStore,
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Routes that need neither a database nor a login.
fn public_routes() -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/lessons", get(routes::lessons::list_lessons))
        .route("/api/lessons/{lesson_id}", get(routes::lessons::get_lesson))
}

/// Read-only router over a lesson catalog.
pub fn public_router(catalog: Arc<LessonCatalog>) -> Router {
    public_routes()
        .layer(Extension(catalog))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

pub fn router(ctx: AppContext) -> Router {
    public_routes()
        // Auth
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/refresh", post(routes::auth::refresh))
        .route("/api/auth/logout", post(routes::auth::logout))
        // Account
        .route("/api/me", get(routes::me::get_me).delete(routes::me::delete_me))
        .route("/api/me/progress", get(routes::me::get_my_progress))
        // Progress notifications
        .route("/api/progress/start", post(routes::progress::start_lesson))
        .route("/api/progress/exercise", post(routes::progress::record_exercise))
        // Server-hosted sessions
        .route("/api/sessions", post(routes::sessions::open_session))
        .route("/api/sessions/current", get(routes::sessions::current_session))
        .route("/api/sessions/current/moves", post(routes::sessions::submit_move))
        .route("/api/sessions/current/restart", post(routes::sessions::restart_exercise))
        .route("/api/sessions/current/next", post(routes::sessions::next_exercise))
        // Admin
        .route("/api/admin/lessons/report", get(routes::admin::lessons_report))
        // Shared state
        .layer(Extension(ctx.pool))
        .layer(Extension(ctx.config))
        .layer(Extension(ctx.catalog))
        .layer(Extension(ctx.report))
        .layer(Extension(ctx.google))
        .layer(Extension(ctx.sessions))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}
