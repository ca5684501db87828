//! SM-2 (SuperMemo 2) spaced repetition scheduler, four-button variant.
//!
//! Each card carries an ease factor (EF), an interval in days and a count of
//! consecutive successful reviews. A rating moves the card as follows:
//! - Again: repetitions reset to 0, EF drops by 0.20, review again tomorrow
//! - Hard: repetitions kept (1 on a first review), EF drops by 0.15, interval grows by 1.2x
//! - Good: repetitions + 1, EF unchanged, interval follows 1 day → 6 days → interval × EF
//! - Easy: repetitions + 1, EF rises by 0.10, interval grows by EF × 1.3
//!
//! EF never falls below 1.3 and every review schedules at least one day ahead. Intervals
//! are capped at `MAX_INTERVAL_DAYS` so long runs of "easy" stay within range.

use super::scheduling_state::{MAX_INTERVAL_DAYS, MIN_EASE_FACTOR, SECONDS_PER_DAY, SchedulingState};
use super::Rating;

const AGAIN_EASE_PENALTY: f64 = 0.20;
const HARD_EASE_PENALTY: f64 = 0.15;
const EASY_EASE_BONUS: f64 = 0.10;
const HARD_INTERVAL_MULTIPLIER: f64 = 1.2;
const EASY_INTERVAL_MULTIPLIER: f64 = 1.3;

/// Calculates the scheduling state that follows `rating` given at `now` (epoch seconds).
pub fn calculate_next_review(state: &SchedulingState, rating: Rating, now: i64) -> SchedulingState {
    let ef = state.ease_factor;

    let (repetitions, ease_factor, interval) = match rating {
        Rating::Again => (0, (ef - AGAIN_EASE_PENALTY).max(MIN_EASE_FACTOR), 1),
        Rating::Hard => {
            // Hard never counts towards graduation beyond the first review
            let reps = if state.repetitions == 0 { 1 } else { state.repetitions };
            let int = round_days(state.interval as f64 * HARD_INTERVAL_MULTIPLIER);
            (reps, (ef - HARD_EASE_PENALTY).max(MIN_EASE_FACTOR), int)
        }
        Rating::Good => {
            let reps = state.repetitions + 1;
            let int = match reps {
                1 => 1,
                2 => 6,
                _ => round_days(state.interval as f64 * ef),
            };
            (reps, ef, int)
        }
        Rating::Easy => {
            let new_ef = ef + EASY_EASE_BONUS;
            let int = round_days(state.interval as f64 * new_ef * EASY_INTERVAL_MULTIPLIER);
            (state.repetitions + 1, new_ef, int)
        }
    };
    let interval = interval.clamp(1, MAX_INTERVAL_DAYS);

    SchedulingState {
        ease_factor: snap_ease_factor(ease_factor),
        interval,
        repetitions,
        next_review_date: now.saturating_add(interval * SECONDS_PER_DAY),
        last_review_date: Some(now),
    }
}

/// Intervals each rating would produce, in `Rating::ALL` order (again, hard, good, easy).
pub fn preview_intervals(state: &SchedulingState, now: i64) -> [i64; 4] {
    Rating::ALL.map(|rating| calculate_next_review(state, rating, now).interval)
}

/// Formats an interval in days as a short label for rating buttons.
pub fn format_interval(days: i64) -> String {
    match days {
        d if d <= 0 => "now".to_string(),
        d if d < 7 => format!("{}d", d),
        d if d < 30 => format!("{}w", d / 7),
        d if d < 365 => format!("{}mo", d / 30),
        d => format!("{}y", d / 365),
    }
}

fn round_days(days: f64) -> i64 {
    days.round() as i64
}

/// Keeps the ease factor at the two-decimal precision the store persists.
fn snap_ease_factor(ease_factor: f64) -> f64 {
    (ease_factor * 100.0).round() / 100.0
}
