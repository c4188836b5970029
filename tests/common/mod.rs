#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use lesson_core::{Exercise, Lesson, LessonCatalog, Ply, STANDARD_START_FEN};
use reqwest::Client;

/// Lesson files shipped with the repository.
pub fn lessons_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/lessons")
}

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}

pub fn exercise(id: &str, fen: &str, script: Vec<Ply>) -> Exercise {
    Exercise {
        id: id.to_string(),
        fen: fen.to_string(),
        label: format!("Exercise {id}"),
        script,
        success_message: format!("{id} done"),
    }
}

/// Two short exercises from the initial position.
pub fn sample_lesson() -> Lesson {
    Lesson {
        lesson_id: "lesson-sample".to_string(),
        title: "Sample".to_string(),
        description: Some("Two short lines".to_string()),
        cover_fen: None,
        exercises: vec![
            exercise(
                "kings-knight",
                STANDARD_START_FEN,
                vec![Ply::user("e2e4"), Ply::system("e7e5"), Ply::user("g1f3")],
            ),
            exercise(
                "queens-pawn",
                STANDARD_START_FEN,
                vec![Ply::user("d2d4"), Ply::system("d7d5")],
            ),
        ],
    }
}

/// Serve the public routes over `catalog` on an ephemeral port.
/// Returns the base URL.
pub async fn spawn_public_server(catalog: LessonCatalog) -> String {
    let app = server::app::public_router(Arc::new(catalog));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });

    format!("http://{addr}")
}
