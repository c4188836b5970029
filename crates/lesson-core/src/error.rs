use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LessonError {
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Lesson '{0}' has no exercises")]
    EmptyLesson(String),

    #[error("Invalid coordinate move '{0}'")]
    InvalidMove(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Bad lesson file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}
