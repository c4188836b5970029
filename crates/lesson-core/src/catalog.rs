//! In-memory lesson catalog.
//!
//! Lessons are loaded once at startup from a directory of JSON files (one
//! lesson per file) and never change afterwards.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::LessonError;
use crate::lesson::{Lesson, LessonSummary};
use crate::validate::validate_lesson;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Loaded,
    Rejected,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResult {
    pub source: String,
    pub lesson_id: Option<String>,
    pub status: LoadStatus,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub results: Vec<LoadResult>,
}

impl LoadReport {
    pub fn loaded_count(&self) -> usize {
        self.results.iter().filter(|r| r.status == LoadStatus::Loaded).count()
    }

    pub fn rejected(&self) -> impl Iterator<Item = &LoadResult> {
        self.results.iter().filter(|r| r.status == LoadStatus::Rejected)
    }

    fn reject(&mut self, source: String, lesson_id: Option<String>, issues: Vec<String>) {
        warn!(%source, ?lesson_id, ?issues, "Lesson rejected");
        self.results.push(LoadResult {
            source,
            lesson_id,
            status: LoadStatus::Rejected,
            issues,
        });
    }
}

#[derive(Debug, Default)]
pub struct LessonCatalog {
    lessons: Vec<Arc<Lesson>>,
    by_id: HashMap<String, usize>,
}

impl LessonCatalog {
    /// Load every `*.json` file in `dir`, in file name order.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<(Self, LoadReport), LessonError> {
        let pattern = dir.as_ref().join("*.json");
        let mut paths: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
            .filter_map(Result::ok)
            .collect();
        paths.sort();

        let mut report = LoadReport::default();
        let mut parsed = Vec::with_capacity(paths.len());

        for path in paths {
            let source = path.display().to_string();
            match read_lesson(&path) {
                Ok(lesson) => parsed.push((source, lesson)),
                Err(e) => report.reject(source, None, vec![e.to_string()]),
            }
        }

        let catalog = Self::build(parsed, &mut report);
        info!(
            dir = %dir.as_ref().display(),
            loaded = report.loaded_count(),
            rejected = report.rejected().count(),
            "Lesson catalog loaded"
        );
        Ok((catalog, report))
    }

    /// Build a catalog from lessons already in memory.
    pub fn from_lessons(lessons: Vec<Lesson>) -> (Self, LoadReport) {
        let mut report = LoadReport::default();
        let sourced = lessons
            .into_iter()
            .map(|l| (format!("inline:{}", l.lesson_id), l))
            .collect();
        let catalog = Self::build(sourced, &mut report);
        (catalog, report)
    }

    fn build(lessons: Vec<(String, Lesson)>, report: &mut LoadReport) -> Self {
        let mut catalog = Self::default();

        for (source, lesson) in lessons {
            let id = lesson.lesson_id.clone();

            if catalog.by_id.contains_key(&id) {
                report.reject(source, Some(id), vec!["duplicate lesson id".to_string()]);
                continue;
            }

            let validation = validate_lesson(&lesson);
            if !validation.is_valid() {
                let issues = validation.issues.iter().map(|i| i.to_string()).collect();
                report.reject(source, Some(id), issues);
                continue;
            }

            catalog.by_id.insert(id.clone(), catalog.lessons.len());
            catalog.lessons.push(Arc::new(lesson));
            report.results.push(LoadResult {
                source,
                lesson_id: Some(id),
                status: LoadStatus::Loaded,
                issues: Vec::new(),
            });
        }

        catalog
    }

    pub fn get(&self, lesson_id: &str) -> Option<Arc<Lesson>> {
        self.by_id.get(lesson_id).map(|&i| Arc::clone(&self.lessons[i]))
    }

    pub fn lessons(&self) -> &[Arc<Lesson>] {
        &self.lessons
    }

    pub fn summaries(&self) -> Vec<LessonSummary> {
        self.lessons.iter().map(|l| l.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

fn read_lesson(path: &Path) -> Result<Lesson, LessonError> {
    let text = fs::read_to_string(path).map_err(|source| LessonError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LessonError::Json {
        path: path.to_path_buf(),
        source,
    })
}
