//! Scripted opening lessons.
//!
//! A lesson is an ordered list of exercises; each exercise is a starting FEN
//! plus a script of user and system plies. The runner checks the learner's
//! move against the script, replays forced system replies through a
//! [`engine::PositionEngine`] and reports completion to a
//! [`progress::ProgressTracker`].

pub mod catalog;
pub mod coordinate;
pub mod engine;
pub mod error;
pub mod lesson;
pub mod progress;
pub mod runner;
pub mod session;
pub mod validate;

pub use catalog::LessonCatalog;
pub use engine::{PositionEngine, ShakmatyEngine};
pub use error::LessonError;
pub use lesson::{Actor, Exercise, Lesson, LessonSummary, Ply};
pub use progress::{ExerciseCompleted, ProgressTracker, RecordingTracker};
pub use runner::{Outcome, RunState, RunStatus, StatusKind};
pub use session::{BoardView, TrainingSession};

/// FEN of the standard starting position.
pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
