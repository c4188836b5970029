//! HTTP tests for the public lesson routes, served in-process.

mod common;

use lesson_core::LessonCatalog;
use serde_json::Value;

async fn base_url() -> String {
    let (catalog, report) = LessonCatalog::from_lessons(vec![common::sample_lesson()]);
    assert_eq!(report.loaded_count(), 1);
    common::spawn_public_server(catalog).await
}

#[tokio::test]
async fn test_health() {
    let base = base_url().await;
    let resp = common::client()
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_list_lessons() {
    let base = base_url().await;
    let resp = common::client()
        .get(format!("{base}/api/lessons"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let lessons = body.as_array().expect("Expected array");
    assert_eq!(lessons.len(), 1);
    assert_eq!(lessons[0]["lessonId"], "lesson-sample");
    assert_eq!(lessons[0]["title"], "Sample");
    assert_eq!(lessons[0]["exerciseCount"], 2);
    assert!(lessons[0].get("exercises").is_none());
}

#[tokio::test]
async fn test_get_lesson() {
    let base = base_url().await;
    let resp = common::client()
        .get(format!("{base}/api/lessons/lesson-sample"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["lessonId"], "lesson-sample");
    let exercises = body["exercises"].as_array().unwrap();
    assert_eq!(exercises.len(), 2);
    assert_eq!(exercises[0]["id"], "kings-knight");
    assert_eq!(exercises[0]["successMessage"], "kings-knight done");
    assert_eq!(exercises[0]["script"][1]["actor"], "system");
    assert_eq!(exercises[0]["script"][1]["uci"], "e7e5");
}

#[tokio::test]
async fn test_unknown_lesson_is_404() {
    let base = base_url().await;
    let resp = common::client()
        .get(format!("{base}/api/lessons/lesson-missing"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Lesson not found");
}

#[tokio::test]
async fn test_shipped_catalog_is_served() {
    let (catalog, _) = LessonCatalog::load_dir(common::lessons_dir()).unwrap();
    let base = common::spawn_public_server(catalog).await;

    let body: Value = common::client()
        .get(format!("{base}/api/lessons"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|l| l["lessonId"].as_str())
        .collect();
    assert!(ids.contains(&"lesson-scholars-mate"));
    assert!(ids.contains(&"lesson-vienna-gambit"));
}
