pub mod due;
pub mod language;
pub mod phrase;
pub mod rating;
pub mod review_session;
pub mod review_stats;
pub mod scheduling_state;
pub mod sm2;
pub mod streak;
pub mod tag;

pub use phrase::{NewPhrase, Phrase, PhraseDetails};
pub use rating::Rating;
pub use review_session::ReviewSession;
pub use review_stats::ReviewStats;
pub use scheduling_state::SchedulingState;
pub use tag::{Tag, TagSummary};
