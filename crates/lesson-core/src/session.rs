//! One learner working through one lesson.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shakmaty::Color;

use crate::coordinate::squares_of;
use crate::engine::{PositionEngine, ShakmatyEngine};
use crate::error::LessonError;
use crate::lesson::{Actor, Exercise, Lesson};
use crate::progress::{ExerciseCompleted, ProgressTracker};
use crate::runner::{self, Outcome, RunState, RunStatus, StatusKind};

/// Owns the single active [`RunState`] of a training session.
///
/// Every position is rebuilt from the exercise FEN, so the session holds no
/// engine of its own; `E` only selects the rules implementation.
#[derive(Debug, Clone)]
pub struct TrainingSession<E = ShakmatyEngine> {
    lesson: Arc<Lesson>,
    state: RunState,
    feedback: Option<Outcome>,
    _engine: PhantomData<fn() -> E>,
}

/// Everything a board UI needs to redraw after a call into the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub lesson_id: String,
    pub lesson_title: String,
    pub exercise_id: String,
    pub exercise_label: String,
    pub exercise_number: usize,
    pub exercise_count: usize,
    pub step: usize,
    pub step_count: usize,
    pub fen: String,
    pub side_to_move: &'static str,
    pub last_move: Option<String>,
    pub last_move_squares: Option<(String, String)>,
    /// The move the script expects next, when it is the learner's turn.
    pub expected: Option<String>,
    pub status: RunStatus,
    pub feedback: Option<String>,
    pub finished: bool,
    pub has_next: bool,
    pub success_message: Option<String>,
    pub lesson_progress: f64,
    pub exercise_progress: f64,
}

impl<E: PositionEngine> TrainingSession<E> {
    /// Open `lesson` at its first exercise.
    pub fn open(lesson: Arc<Lesson>) -> Result<Self, LessonError> {
        Self::open_at(lesson, 0)
    }

    /// Open `lesson` at `exercise_index`, clamped to the last exercise.
    pub fn open_at(lesson: Arc<Lesson>, exercise_index: usize) -> Result<Self, LessonError> {
        if lesson.exercises.is_empty() {
            return Err(LessonError::EmptyLesson(lesson.lesson_id.clone()));
        }
        let state = RunState {
            exercise_index: exercise_index.min(lesson.exercises.len() - 1),
            ..RunState::default()
        };
        Ok(Self {
            lesson,
            state,
            feedback: None,
            _engine: PhantomData,
        })
    }

    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    pub fn exercise(&self) -> &Exercise {
        &self.lesson.exercises[self.state.exercise_index]
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Outcome of the most recent move attempt.
    pub fn feedback(&self) -> Option<&Outcome> {
        self.feedback.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        runner::is_finished(self.exercise(), &self.state)
    }

    pub fn has_next(&self) -> bool {
        self.state.exercise_index + 1 < self.lesson.exercises.len()
    }

    pub fn submit_move(&mut self, uci: &str, tracker: &mut dyn ProgressTracker) -> Outcome {
        self.submit_move_at(uci, Utc::now(), tracker)
    }

    /// Run `uci` through the script runner; a transition into success is
    /// reported to `tracker` stamped with `now`.
    pub fn submit_move_at(
        &mut self,
        uci: &str,
        now: DateTime<Utc>,
        tracker: &mut dyn ProgressTracker,
    ) -> Outcome {
        let exercise_index = self.state.exercise_index;
        let exercise = &self.lesson.exercises[exercise_index];
        let outcome = runner::validate_and_advance::<E>(exercise, &mut self.state, uci);

        if outcome.completed() {
            tracker.notify_exercise_completed(&ExerciseCompleted {
                lesson_id: self.lesson.lesson_id.clone(),
                exercise_id: exercise.id.clone(),
                exercise_index,
                completed_at: now,
            });
        }

        self.feedback = Some(outcome.clone());
        outcome
    }

    pub fn restart(&mut self) {
        self.state = runner::restart_exercise(&self.state);
        self.feedback = None;
    }

    pub fn next_exercise(&mut self) {
        self.state = runner::advance_to_next_exercise(&self.state, &self.lesson);
        self.feedback = None;
    }

    /// Current position; falls back to the exercise start when the script
    /// cannot be replayed.
    pub fn position(&self) -> Result<E, LessonError> {
        let exercise = self.exercise();
        runner::position_at(exercise, self.state.ply_index)
            .or_else(|_| E::load(&exercise.fen))
    }

    pub fn view(&self) -> BoardView {
        let exercise = self.exercise();
        let ply_index = self.state.ply_index;
        let step_count = exercise.script.len();

        let (fen, side_to_move) = match self.position() {
            Ok(engine) => (engine.current_fen(), color_name(engine.side_to_move())),
            Err(_) => (exercise.fen.clone(), "white"),
        };

        let expected = exercise
            .script
            .get(ply_index)
            .filter(|p| p.actor == Actor::User)
            .map(|p| p.uci.clone());

        let success_message = (self.state.status.kind == StatusKind::Success)
            .then(|| exercise.success_message.clone());

        BoardView {
            lesson_id: self.lesson.lesson_id.clone(),
            lesson_title: self.lesson.title.clone(),
            exercise_id: exercise.id.clone(),
            exercise_label: exercise.label.clone(),
            exercise_number: self.state.exercise_index + 1,
            exercise_count: self.lesson.exercises.len(),
            step: (ply_index + 1).min(step_count),
            step_count,
            fen,
            side_to_move,
            last_move: self.state.last_move.clone(),
            last_move_squares: self
                .state
                .last_move
                .as_deref()
                .and_then(squares_of)
                .map(|(from, to)| (from.to_string(), to.to_string())),
            expected,
            status: self.state.status.clone(),
            feedback: self.feedback.as_ref().map(|o| o.to_string()),
            finished: self.is_finished(),
            has_next: self.has_next(),
            success_message,
            lesson_progress: (self.state.exercise_index + 1) as f64 / self.lesson.exercises.len() as f64,
            exercise_progress: if step_count == 0 {
                1.0
            } else {
                ply_index.min(step_count) as f64 / step_count as f64
            },
        }
    }
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::Ply;
    use crate::progress::RecordingTracker;
    use crate::runner::MoveResult;
    use crate::STANDARD_START_FEN;

    fn lesson() -> Arc<Lesson> {
        Arc::new(Lesson {
            lesson_id: "lesson-openings".into(),
            title: "Openings".into(),
            description: None,
            cover_fen: None,
            exercises: vec![
                Exercise {
                    id: "kings-pawn".into(),
                    fen: STANDARD_START_FEN.into(),
                    label: "King's pawn".into(),
                    script: vec![Ply::user("e2e4"), Ply::system("e7e5"), Ply::user("g1f3")],
                    success_message: "Knight out!".into(),
                },
                Exercise {
                    id: "queens-pawn".into(),
                    fen: STANDARD_START_FEN.into(),
                    label: "Queen's pawn".into(),
                    script: vec![Ply::user("d2d4")],
                    success_message: "Solid.".into(),
                },
            ],
        })
    }

    #[test]
    fn test_open_rejects_empty_lesson() {
        let empty = Arc::new(Lesson {
            lesson_id: "empty".into(),
            title: "Empty".into(),
            description: None,
            cover_fen: None,
            exercises: vec![],
        });
        let result: Result<TrainingSession, _> = TrainingSession::open(empty);
        assert!(matches!(result, Err(LessonError::EmptyLesson(_))));
    }

    #[test]
    fn test_full_lesson_notifies_once_per_exercise() {
        let mut session: TrainingSession = TrainingSession::open(lesson()).unwrap();
        let mut tracker = RecordingTracker::new();

        assert!(session.submit_move("e2e4", &mut tracker).is_ok());
        assert!(tracker.events().is_empty());
        assert!(session.submit_move("g1f3", &mut tracker).completed());
        assert_eq!(tracker.events().len(), 1);
        assert_eq!(tracker.events()[0].exercise_id, "kings-pawn");
        assert_eq!(tracker.events()[0].exercise_index, 0);

        // Finished: further moves are rejected and nothing is re-sent.
        assert_eq!(session.submit_move("g1f3", &mut tracker).kind(), MoveResult::Illegal);
        assert_eq!(tracker.events().len(), 1);

        session.next_exercise();
        assert_eq!(session.exercise().id, "queens-pawn");
        assert!(session.submit_move("d2d4", &mut tracker).completed());
        assert_eq!(tracker.events().len(), 2);
        assert_eq!(tracker.events()[1].exercise_index, 1);
        assert!(!session.has_next());
    }

    #[test]
    fn test_restart_then_replay_notifies_again() {
        let mut session: TrainingSession = TrainingSession::open_at(lesson(), 1).unwrap();
        let mut tracker = RecordingTracker::new();

        session.submit_move("d2d4", &mut tracker);
        session.restart();
        assert_eq!(session.state().ply_index, 0);
        assert!(session.feedback().is_none());
        session.submit_move("d2d4", &mut tracker);

        assert_eq!(tracker.events().len(), 2);
    }

    #[test]
    fn test_open_at_clamps() {
        let session: TrainingSession = TrainingSession::open_at(lesson(), 9).unwrap();
        assert_eq!(session.state().exercise_index, 1);
    }

    #[test]
    fn test_view_after_reply() {
        let mut session: TrainingSession = TrainingSession::open(lesson()).unwrap();
        let mut tracker = RecordingTracker::new();

        let view = session.view();
        assert_eq!(view.step, 1);
        assert_eq!(view.step_count, 3);
        assert_eq!(view.expected.as_deref(), Some("e2e4"));
        assert_eq!(view.side_to_move, "white");
        assert_eq!(view.last_move, None);
        assert_eq!(view.lesson_progress, 0.5);

        session.submit_move("d2d4", &mut tracker);
        assert_eq!(session.view().feedback.as_deref(), Some("wrong move, expected e2e4"));

        session.submit_move("e2e4", &mut tracker);
        let view = session.view();
        assert_eq!(view.step, 3);
        assert_eq!(view.last_move.as_deref(), Some("e7e5"));
        assert_eq!(
            view.last_move_squares,
            Some(("e7".to_string(), "e5".to_string()))
        );
        assert_eq!(view.expected.as_deref(), Some("g1f3"));
        assert_eq!(
            view.fen,
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
        );
        assert!(!view.finished);
        assert_eq!(view.success_message, None);

        session.submit_move("g1f3", &mut tracker);
        let view = session.view();
        assert!(view.finished);
        assert_eq!(view.step, 3);
        assert_eq!(view.exercise_progress, 1.0);
        assert_eq!(view.success_message.as_deref(), Some("Knight out!"));
        assert_eq!(view.expected, None);
    }
}
