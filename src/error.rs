//! Error type shared by the scheduler, the store and the exporters.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Invalid rating: {0:?} (expected again, hard, good or easy)")]
    InvalidRating(String),

    #[error("No scheduling state found for phrase {0}")]
    MissingState(i64),

    #[error("Phrase not found: {0}")]
    PhraseNotFound(i64),

    #[error("Phrase already saved with this language pair")]
    DuplicatePhrase,

    #[error("Phrase {phrase_id} is not tagged with tag {tag_id}")]
    TagLinkNotFound { phrase_id: i64, tag_id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database connection lock poisoned")]
    LockPoisoned,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
