pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use error::{Result, ReviewError};
pub use models::{NewPhrase, Phrase, PhraseDetails, Rating, ReviewSession, ReviewStats, SchedulingState};
