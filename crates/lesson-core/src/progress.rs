//! Completion events and the tracker seam that persists them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseCompleted {
    pub lesson_id: String,
    pub exercise_id: String,
    pub exercise_index: usize,
    pub completed_at: DateTime<Utc>,
}

/// Receives one call per transition of an exercise into success.
///
/// De-duplication (restart then replay) is left to the implementation.
pub trait ProgressTracker {
    fn notify_exercise_completed(&mut self, event: &ExerciseCompleted);
}

/// Buffers events so an async caller can forward them later.
#[derive(Debug, Default)]
pub struct RecordingTracker {
    events: Vec<ExerciseCompleted>,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ExerciseCompleted] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<ExerciseCompleted> {
        std::mem::take(&mut self.events)
    }
}

impl ProgressTracker for RecordingTracker {
    fn notify_exercise_completed(&mut self, event: &ExerciseCompleted) {
        self.events.push(event.clone());
    }
}

/// Logs completions and drops them.
#[derive(Debug, Default)]
pub struct LoggingTracker;

impl ProgressTracker for LoggingTracker {
    fn notify_exercise_completed(&mut self, event: &ExerciseCompleted) {
        tracing::info!(
            lesson_id = %event.lesson_id,
            exercise_id = %event.exercise_id,
            exercise_index = event.exercise_index,
            "Exercise completed"
        );
    }
}
