//! Review session over the phrases that are due.
//! Walks the due cards one by one and feeds ratings to the SM-2 scheduler.

use super::{Phrase, Rating, SchedulingState};
use crate::database::db::{apply_rating, list_due};
use crate::error::{Result, ReviewError};
use crate::models::sm2::preview_intervals;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Manages a review session with one or more rounds.
/// Cards rated "again" are shown once more in the following round.
pub struct ReviewSession {
    pub cards: Vec<(Phrase, SchedulingState)>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub show_translation: bool,
    pub conn: Arc<Mutex<Connection>>,
    pub round_number: usize,
    retry_cards: Vec<usize>,
    reviews_done: usize,
}

impl ReviewSession {
    /// Creates a session from cards that are already known to be due.
    pub fn new_from_due_cards(
        cards: Vec<(Phrase, SchedulingState)>,
        conn: Arc<Mutex<Connection>>,
    ) -> Self {
        let indices: Vec<usize> = (0..cards.len()).collect();

        Self {
            cards,
            current_round_cards: indices,
            current_index: 0,
            show_translation: false,
            conn,
            round_number: 1,
            retry_cards: Vec::new(),
            reviews_done: 0,
        }
    }

    /// Loads every phrase due at `now`, oldest due first, into a new session.
    pub fn start(now: i64, conn: Arc<Mutex<Connection>>) -> Result<Self> {
        let cards = {
            let guard = conn.lock().map_err(|_| ReviewError::LockPoisoned)?;
            list_due(now, &guard)?
        };
        log::info!("Starting review session with {} due cards", cards.len());
        Ok(Self::new_from_due_cards(cards, conn))
    }

    pub fn current_card(&self) -> Option<&(Phrase, SchedulingState)> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.cards.get(idx))
    }

    pub fn toggle_translation(&mut self) {
        self.show_translation = !self.show_translation;
    }

    /// Intervals (again, hard, good, easy) the current card would get at `now`.
    pub fn preview_current(&self, now: i64) -> Option<[i64; 4]> {
        self.current_card()
            .map(|(_, state)| preview_intervals(state, now))
    }

    /// Rates the current card, stores its new state and moves to the next card.
    pub fn rate_current_card(&mut self, rating: Rating, now: i64) -> Result<SchedulingState> {
        let Some(&idx) = self.current_round_cards.get(self.current_index) else {
            return Err(ReviewError::InvalidInput("review session is already complete".to_string()));
        };
        let phrase_id = self.cards[idx].0.id;

        let next = {
            let conn = self.conn.lock().map_err(|_| ReviewError::LockPoisoned)?;
            apply_rating(phrase_id, rating, now, &conn)?
        };

        self.cards[idx].1 = next.clone();
        self.reviews_done += 1;
        if rating == Rating::Again {
            self.retry_cards.push(idx);
        }
        self.next_card();
        Ok(next)
    }

    fn next_card(&mut self) {
        self.show_translation = false;
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards rated "again".
    /// If there are none, the session is complete.
    fn start_next_round(&mut self) {
        self.current_round_cards = std::mem::take(&mut self.retry_cards);
        self.current_index = 0;
        if !self.current_round_cards.is_empty() {
            self.round_number += 1;
        }
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count().saturating_sub(self.current_index)
    }

    /// Number of ratings submitted so far, retries included.
    pub fn reviews_done(&self) -> usize {
        self.reviews_done
    }

    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number,
                self.total_count()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db::{get_scheduling_state, open_in_memory, save_phrase};
    use crate::models::NewPhrase;

    const NOW: i64 = 1_700_000_000;

    fn session_with(sources: &[&str]) -> (ReviewSession, Vec<i64>) {
        let conn = open_in_memory().unwrap();
        let ids = sources
            .iter()
            .enumerate()
            .map(|(i, source)| {
                let new_phrase = NewPhrase {
                    source_phrase: source.to_string(),
                    translation: format!("{}!", source),
                    source_language: "en".to_string(),
                    target_language: "it".to_string(),
                };
                save_phrase(&new_phrase, NOW - 10 + i as i64, &conn).unwrap()
            })
            .collect();
        let session = ReviewSession::start(NOW, Arc::new(Mutex::new(conn))).unwrap();
        (session, ids)
    }

    #[test]
    fn test_empty_session_is_complete() {
        let (session, _) = session_with(&[]);
        assert!(session.is_completed());
        assert!(session.current_card().is_none());
    }

    #[test]
    fn test_single_round() {
        let (mut session, ids) = session_with(&["one", "two"]);
        assert_eq!(session.phase_message(), "Round 1: 2 cards");
        assert_eq!(session.current_card().unwrap().0.id, ids[0]);

        session.toggle_translation();
        assert!(session.show_translation);
        session.rate_current_card(Rating::Good, NOW).unwrap();
        assert!(!session.show_translation);
        assert_eq!(session.remaining_count(), 1);

        session.rate_current_card(Rating::Easy, NOW).unwrap();
        assert!(session.is_completed());
        assert_eq!(session.reviews_done(), 2);

        let conn = session.conn.lock().unwrap();
        let state = get_scheduling_state(ids[0], &conn).unwrap().unwrap();
        assert_eq!(state.repetitions, 1);
    }

    #[test]
    fn test_again_cards_are_retried() {
        let (mut session, ids) = session_with(&["one", "two", "three"]);
        session.rate_current_card(Rating::Again, NOW).unwrap();
        session.rate_current_card(Rating::Good, NOW).unwrap();
        session.rate_current_card(Rating::Again, NOW).unwrap();

        assert!(!session.is_completed());
        assert_eq!(session.round_number, 2);
        assert_eq!(session.phase_message(), "Round 2 (Review): 2 cards to retry");
        assert_eq!(session.current_card().unwrap().0.id, ids[0]);

        session.rate_current_card(Rating::Good, NOW + 60).unwrap();
        session.rate_current_card(Rating::Again, NOW + 60).unwrap();
        assert_eq!(session.round_number, 3);
        assert_eq!(session.current_card().unwrap().0.id, ids[2]);

        session.rate_current_card(Rating::Hard, NOW + 120).unwrap();
        assert!(session.is_completed());
        assert_eq!(session.reviews_done(), 6);
    }

    #[test]
    fn test_preview_current() {
        let (session, _) = session_with(&["one"]);
        assert_eq!(session.preview_current(NOW), Some([1, 1, 1, 1]));
    }

    #[test]
    fn test_rating_after_completion_fails() {
        let (mut session, _) = session_with(&[]);
        assert!(session.rate_current_card(Rating::Good, NOW).is_err());
    }
}
