//! Lesson content checks, run once when lessons are loaded.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::coordinate::CoordinateMove;
use crate::engine::{PositionEngine, ShakmatyEngine};
use crate::lesson::{Actor, Exercise, Lesson};

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

/// One problem found in lesson content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ply_index: Option<usize>,
    pub message: String,
}

impl fmt::Display for ContentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = &self.exercise_id {
            write!(f, "[{id}")?;
            if let Some(ply) = self.ply_index {
                write!(f, " ply {ply}")?;
            }
            write!(f, "] ")?;
        }
        write!(f, "{}", self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub lesson_id: String,
    pub issues: Vec<ContentIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

struct IssueSink {
    issues: Vec<ContentIssue>,
}

impl IssueSink {
    fn lesson(&mut self, message: impl Into<String>) {
        self.issues.push(ContentIssue {
            exercise_id: None,
            ply_index: None,
            message: message.into(),
        });
    }

    fn exercise(&mut self, exercise: &Exercise, ply_index: Option<usize>, message: impl Into<String>) {
        self.issues.push(ContentIssue {
            exercise_id: Some(exercise.id.clone()),
            ply_index,
            message: message.into(),
        });
    }
}

/// Check the shape of a lesson and replay every exercise script.
pub fn validate_lesson(lesson: &Lesson) -> ValidationReport {
    let mut sink = IssueSink { issues: Vec::new() };

    if !SLUG_RE.is_match(&lesson.lesson_id) {
        sink.lesson(format!(
            "lesson id '{}' must be lowercase letters, digits and dashes",
            lesson.lesson_id
        ));
    }
    if lesson.title.trim().is_empty() {
        sink.lesson("title is empty");
    }
    if let Some(cover) = &lesson.cover_fen {
        if let Err(e) = ShakmatyEngine::load(cover) {
            sink.lesson(format!("cover position: {e}"));
        }
    }
    if lesson.exercises.is_empty() {
        sink.lesson("lesson has no exercises");
    }

    let mut seen = HashSet::new();
    for exercise in &lesson.exercises {
        if exercise.id.trim().is_empty() {
            sink.lesson("exercise with empty id");
        } else if !seen.insert(exercise.id.as_str()) {
            sink.exercise(exercise, None, "duplicate exercise id");
        }
        validate_exercise(exercise, &mut sink);
    }

    ValidationReport {
        lesson_id: lesson.lesson_id.clone(),
        issues: sink.issues,
    }
}

fn validate_exercise(exercise: &Exercise, sink: &mut IssueSink) {
    if exercise.label.trim().is_empty() {
        sink.exercise(exercise, None, "label is empty");
    }
    if exercise.success_message.trim().is_empty() {
        sink.exercise(exercise, None, "success message is empty");
    }

    match exercise.script.first() {
        None => {
            sink.exercise(exercise, None, "script is empty");
            return;
        }
        Some(first) if first.actor != Actor::User => {
            sink.exercise(exercise, Some(0), "script must open with a user ply");
        }
        Some(_) => {}
    }

    let mut well_formed = true;
    for (i, ply) in exercise.script.iter().enumerate() {
        if ply.uci.parse::<CoordinateMove>().is_err() {
            sink.exercise(exercise, Some(i), format!("'{}' is not a coordinate move", ply.uci));
            well_formed = false;
        }
    }
    if !well_formed {
        return;
    }

    let mut engine = match ShakmatyEngine::load(&exercise.fen) {
        Ok(engine) => engine,
        Err(e) => {
            sink.exercise(exercise, None, e.to_string());
            return;
        }
    };

    for (i, ply) in exercise.script.iter().enumerate() {
        let fen_before = engine.current_fen();
        if engine.apply_uci(&ply.uci).is_none() {
            sink.exercise(
                exercise,
                Some(i),
                format!("'{}' is illegal in {fen_before}", ply.uci),
            );
            return;
        }
    }
}
