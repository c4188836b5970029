//! Check lesson content before it ships.
//!
//! Loads every `*.json` lesson in a directory, replays each script and prints
//! one line per file. Exits non-zero when any lesson is rejected.
//!
//! Usage: cargo run --bin validate-lessons -- [lessons_dir]

use std::env;
use std::path::PathBuf;

use lesson_core::catalog::LoadStatus;
use lesson_core::LessonCatalog;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let dir = env::args()
        .nth(1)
        .or_else(|| env::var("LESSONS_DIR").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/lessons"));

    println!("Validating lessons in {}", dir.display());
    let (catalog, report) = LessonCatalog::load_dir(&dir)?;

    if report.results.is_empty() {
        eprintln!("No lesson files found in {}", dir.display());
        std::process::exit(1);
    }

    for result in &report.results {
        let id = result.lesson_id.as_deref().unwrap_or("?");
        match result.status {
            LoadStatus::Loaded => {
                let exercises = catalog.get(id).map(|l| l.exercises.len()).unwrap_or(0);
                println!("  ok       {id} ({exercises} exercises) {}", result.source);
            }
            LoadStatus::Rejected => {
                println!("  REJECTED {id} {}", result.source);
                for issue in &result.issues {
                    println!("           - {issue}");
                }
            }
        }
    }

    let rejected = report.rejected().count();
    println!();
    println!("{} loaded, {} rejected", report.loaded_count(), rejected);

    if rejected > 0 {
        std::process::exit(1);
    }
    Ok(())
}
