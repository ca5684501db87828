use crate::error::{Result, ReviewError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
/// Longest interval the scheduler hands out (100 years).
pub const MAX_INTERVAL_DAYS: i64 = 36_500;

/// Spaced repetition state of a single phrase.
///
/// Timestamps are absolute epoch seconds. The ease factor is kept as a decimal here;
/// the store scales it to an integer (x100) on write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingState {
    pub ease_factor: f64,
    pub interval: i64,
    pub repetitions: i64,
    pub next_review_date: i64,
    pub last_review_date: Option<i64>,
}

impl SchedulingState {
    /// Fresh state for a new phrase. The first due date is supplied by the caller
    /// rather than defaulted.
    pub fn new(next_review_date: i64) -> Self {
        Self {
            ease_factor: DEFAULT_EASE_FACTOR,
            interval: 0,
            repetitions: 0,
            next_review_date,
            last_review_date: None,
        }
    }

    pub fn is_due(&self, now: i64) -> bool {
        self.next_review_date <= now
    }

    /// Checks a state that did not come from the scheduler, such as one read from a backup.
    ///
    /// A reviewed state must have an interval of at least one day and a next review
    /// date exactly `interval` days after the last review.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(ReviewError::InvalidInput(reason));

        if !self.ease_factor.is_finite() || self.ease_factor < MIN_EASE_FACTOR {
            return invalid(format!(
                "ease factor {} is below the minimum of {}",
                self.ease_factor, MIN_EASE_FACTOR
            ));
        }
        if !(0..=MAX_INTERVAL_DAYS).contains(&self.interval) {
            return invalid(format!("interval {} is out of range", self.interval));
        }
        if self.repetitions < 0 {
            return invalid(format!("repetitions {} is negative", self.repetitions));
        }
        if let Some(last) = self.last_review_date {
            if self.interval < 1 {
                return invalid("a reviewed state needs an interval of at least one day".to_string());
            }
            let expected = last.checked_add(self.interval * SECONDS_PER_DAY);
            if expected != Some(self.next_review_date) {
                return invalid(format!(
                    "next review date {} does not match last review {} plus {} days",
                    self.next_review_date, last, self.interval
                ));
            }
        }
        Ok(())
    }
}

/// Ease factor as persisted: hundredths, rounded half-up.
pub fn ease_factor_to_stored(ease_factor: f64) -> i64 {
    (ease_factor * 100.0).round() as i64
}

pub fn ease_factor_from_stored(stored: i64) -> f64 {
    stored as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let state = SchedulingState::new(1_000);
        assert_eq!(state.ease_factor, 2.5);
        assert_eq!(state.interval, 0);
        assert_eq!(state.repetitions, 0);
        assert_eq!(state.next_review_date, 1_000);
        assert_eq!(state.last_review_date, None);
    }

    #[test]
    fn test_is_due_is_inclusive() {
        let state = SchedulingState::new(1_000);
        assert!(!state.is_due(999));
        assert!(state.is_due(1_000));
        assert!(state.is_due(1_001));
    }

    #[test]
    fn test_ease_factor_scaling() {
        assert_eq!(ease_factor_to_stored(2.5), 250);
        assert_eq!(ease_factor_to_stored(2.35), 235);
        assert_eq!(ease_factor_to_stored(1.3), 130);
        assert_eq!(ease_factor_from_stored(260), 2.6);
        assert_eq!(ease_factor_from_stored(ease_factor_to_stored(2.15)), 2.15);
    }

    #[test]
    fn test_validate_accepts_fresh_and_reviewed_states() {
        assert!(SchedulingState::new(1_000).validate().is_ok());

        let reviewed = SchedulingState {
            ease_factor: 2.6,
            interval: 6,
            repetitions: 2,
            next_review_date: 1_000 + 6 * SECONDS_PER_DAY,
            last_review_date: Some(1_000),
        };
        assert!(reviewed.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_broken_states() {
        let reviewed = SchedulingState {
            ease_factor: 2.5,
            interval: 1,
            repetitions: 1,
            next_review_date: 1_000 + SECONDS_PER_DAY,
            last_review_date: Some(1_000),
        };

        let broken = [
            SchedulingState { ease_factor: 0.2, ..reviewed.clone() },
            SchedulingState { ease_factor: f64::NAN, ..reviewed.clone() },
            SchedulingState { interval: -5, ..SchedulingState::new(1_000) },
            SchedulingState { interval: MAX_INTERVAL_DAYS + 1, ..SchedulingState::new(1_000) },
            SchedulingState { repetitions: -3, ..reviewed.clone() },
            SchedulingState { interval: 0, next_review_date: 1_000, ..reviewed.clone() },
            SchedulingState { next_review_date: 5, ..reviewed.clone() },
        ];
        for state in broken {
            assert!(
                matches!(state.validate(), Err(ReviewError::InvalidInput(_))),
                "accepted {:?}",
                state
            );
        }
    }
}
