use std::sync::Arc;

use axum::{Extension, Json};
use lesson_core::catalog::{LoadReport, LoadResult};
use serde::Serialize;

use crate::auth::middleware::AdminUser;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonReportResponse {
    pub loaded: usize,
    pub rejected: usize,
    pub results: Vec<LoadResult>,
}

pub async fn lessons_report(
    _admin: AdminUser,
    Extension(report): Extension<Arc<LoadReport>>,
) -> Json<LessonReportResponse> {
    Json(LessonReportResponse {
        loaded: report.loaded_count(),
        rejected: report.rejected().count(),
        results: report.results.clone(),
    })
}
