//! Lesson content as it is stored on disk and served over the API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    User,
    System,
}

/// One scripted half-move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ply {
    pub actor: Actor,
    pub uci: String,
}

impl Ply {
    pub fn user(uci: &str) -> Self {
        Self { actor: Actor::User, uci: uci.to_string() }
    }

    pub fn system(uci: &str) -> Self {
        Self { actor: Actor::System, uci: uci.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub fen: String,
    pub label: String,
    pub script: Vec<Ply>,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub lesson_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_fen: Option<String>,
    pub exercises: Vec<Exercise>,
}

impl Lesson {
    pub fn exercise_index(&self, exercise_id: &str) -> Option<usize> {
        self.exercises.iter().position(|e| e.id == exercise_id)
    }

    pub fn summary(&self) -> LessonSummary {
        LessonSummary {
            lesson_id: self.lesson_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            cover_fen: self.cover_fen.clone(),
            exercise_count: self.exercises.len(),
        }
    }
}

/// Lesson list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSummary {
    pub lesson_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_fen: Option<String>,
    pub exercise_count: usize,
}
