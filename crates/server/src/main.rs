use std::sync::Arc;

use anyhow::Context;
use lesson_core::LessonCatalog;
use server::app::{self, AppContext};
use server::auth::google::GoogleVerifier;
use server::config::Config;
use server::db;
use server::sessions::SessionStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let (catalog, report) = LessonCatalog::load_dir(&config.lessons_dir)
        .with_context(|| format!("loading lessons from {}", config.lessons_dir.display()))?;
    for rejected in report.rejected() {
        tracing::warn!(source = %rejected.source, issues = ?rejected.issues, "Lesson not served");
    }
    if catalog.is_empty() {
        tracing::warn!("No lessons loaded from {}", config.lessons_dir.display());
    }

    tracing::info!("Connecting to database...");
    let pool = db::pool::create_pool(&config.database_url)
        .await
        .context("connecting to database")?;

    tracing::info!("Running migrations...");
    db::pool::run_migrations(&pool)
        .await
        .context("running migrations")?;

    let google = GoogleVerifier::new(&config.google_client_id, &config.google_tokeninfo_url)?;
    let addr = format!("{}:{}", config.host, config.port);

    let app = app::router(AppContext {
        pool,
        config,
        catalog: Arc::new(catalog),
        report: Arc::new(report),
        google,
        sessions: SessionStore::new(),
    });

    tracing::info!("Starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    axum::serve(listener, app).await?;
    Ok(())
}
