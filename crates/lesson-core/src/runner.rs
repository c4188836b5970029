//! Script runner.
//!
//! Decides whether a learner's move is the one the script expects, plays the
//! forced system replies that follow, and flags exercise completion. The
//! position is always rebuilt from the exercise FEN by replaying the plies
//! already accepted, so no engine state outlives a single call.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::PositionEngine;
use crate::error::LessonError;
use crate::lesson::{Actor, Exercise, Lesson};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Ready,
    Wrong,
    Illegal,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub kind: StatusKind,
    pub message: String,
}

impl RunStatus {
    pub fn ready() -> Self {
        Self { kind: StatusKind::Ready, message: "ready".to_string() }
    }

    pub fn success(message: &str) -> Self {
        Self { kind: StatusKind::Success, message: message.to_string() }
    }

    fn script_defect(uci: &str) -> Self {
        Self {
            kind: StatusKind::Illegal,
            message: format!("System script illegal: {uci}"),
        }
    }
}

/// Progression cursor of one training session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub exercise_index: usize,
    /// Plies of the current exercise already applied.
    pub ply_index: usize,
    pub status: RunStatus,
    /// Last applied ply, for highlighting.
    pub last_move: Option<String>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            exercise_index: 0,
            ply_index: 0,
            status: RunStatus::ready(),
            last_move: None,
        }
    }
}

/// Why a move was rejected without touching the run state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The exercise script is exhausted.
    Finished,
    /// The next scripted ply belongs to the system.
    NotUserTurn { ply_index: usize },
    /// The engine refused the move.
    Unplayable { uci: String },
    /// The position before the move could not be rebuilt.
    BadPosition { reason: String },
}

/// An accepted move and everything that was auto-played after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    /// Plies applied by this call, the user's move included.
    pub plies_applied: usize,
    /// The exercise reached its end with this call.
    pub completed: bool,
    /// A scripted system ply the engine refused, if auto-play stopped on one.
    pub script_defect: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok(Advance),
    Wrong { expected: String },
    Illegal(Rejection),
}

/// Coarse result for callers that only branch on the three outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveResult {
    Ok,
    Wrong,
    Illegal,
}

impl Outcome {
    pub fn kind(&self) -> MoveResult {
        match self {
            Outcome::Ok(_) => MoveResult::Ok,
            Outcome::Wrong { .. } => MoveResult::Wrong,
            Outcome::Illegal(_) => MoveResult::Illegal,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn completed(&self) -> bool {
        matches!(self, Outcome::Ok(Advance { completed: true, .. }))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ok(Advance { script_defect: Some(uci), .. }) => {
                write!(f, "System script illegal: {uci}")
            }
            Outcome::Ok(Advance { completed: true, .. }) => write!(f, "exercise complete"),
            Outcome::Ok(_) => write!(f, "correct"),
            Outcome::Wrong { expected } => write!(f, "wrong move, expected {expected}"),
            Outcome::Illegal(Rejection::Finished) => write!(f, "exercise already finished"),
            Outcome::Illegal(Rejection::NotUserTurn { ply_index }) => {
                write!(f, "not expecting a user move now (system move at ply {ply_index})")
            }
            Outcome::Illegal(Rejection::Unplayable { uci }) => write!(f, "illegal move: {uci}"),
            Outcome::Illegal(Rejection::BadPosition { reason }) => {
                write!(f, "position unavailable: {reason}")
            }
        }
    }
}

pub fn is_finished(exercise: &Exercise, state: &RunState) -> bool {
    state.ply_index >= exercise.script.len()
}

/// Rebuild the position after the first `ply_index` plies of the script.
pub fn position_at<E: PositionEngine>(exercise: &Exercise, ply_index: usize) -> Result<E, LessonError> {
    let mut engine = E::load(&exercise.fen)?;
    for ply in exercise.script.iter().take(ply_index) {
        if engine.apply_uci(&ply.uci).is_none() {
            return Err(LessonError::InvalidMove(ply.uci.clone()));
        }
    }
    Ok(engine)
}

/// Check `user_move` against the script and advance `state` on success.
///
/// Anything other than [`Outcome::Ok`] leaves `state` exactly as it was.
pub fn validate_and_advance<E: PositionEngine>(
    exercise: &Exercise,
    state: &mut RunState,
    user_move: &str,
) -> Outcome {
    let Some(expected) = exercise.script.get(state.ply_index) else {
        return Outcome::Illegal(Rejection::Finished);
    };

    if expected.actor != Actor::User {
        return Outcome::Illegal(Rejection::NotUserTurn { ply_index: state.ply_index });
    }

    if user_move != expected.uci {
        debug!(exercise = %exercise.id, played = user_move, expected = %expected.uci, "Off-script move");
        return Outcome::Wrong { expected: expected.uci.clone() };
    }

    let mut engine: E = match position_at(exercise, state.ply_index) {
        Ok(engine) => engine,
        Err(e) => {
            return Outcome::Illegal(Rejection::BadPosition { reason: e.to_string() });
        }
    };

    if engine.apply_uci(user_move).is_none() {
        return Outcome::Illegal(Rejection::Unplayable { uci: user_move.to_string() });
    }

    let mut ply_index = state.ply_index + 1;
    let mut last_move = user_move.to_string();
    let mut script_defect = None;

    while let Some(ply) = exercise.script.get(ply_index) {
        if ply.actor != Actor::System {
            break;
        }
        if engine.apply_uci(&ply.uci).is_none() {
            warn!(exercise = %exercise.id, ply_index, uci = %ply.uci, "Scripted system move rejected");
            script_defect = Some(ply.uci.clone());
            break;
        }
        last_move = ply.uci.clone();
        ply_index += 1;
    }

    let completed = script_defect.is_none() && ply_index >= exercise.script.len();
    let status = match &script_defect {
        Some(uci) => RunStatus::script_defect(uci),
        None if completed => RunStatus::success(&exercise.success_message),
        None => RunStatus::ready(),
    };

    let plies_applied = ply_index - state.ply_index;
    state.ply_index = ply_index;
    state.last_move = Some(last_move);
    state.status = status;

    Outcome::Ok(Advance {
        plies_applied,
        completed,
        script_defect,
    })
}

/// Back to the first ply of the current exercise.
pub fn restart_exercise(state: &RunState) -> RunState {
    RunState {
        exercise_index: state.exercise_index,
        ..RunState::default()
    }
}

/// Move to the next exercise, staying on the last one when there is none.
pub fn advance_to_next_exercise(state: &RunState, lesson: &Lesson) -> RunState {
    let last = lesson.exercises.len().saturating_sub(1);
    RunState {
        exercise_index: (state.exercise_index + 1).min(last),
        ..RunState::default()
    }
}
