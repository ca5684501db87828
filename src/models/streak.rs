//! Daily review streak.
//!
//! Review timestamps are bucketed into calendar days of the given timezone. The streak
//! counts consecutive days walking back from today; a day without reviews ends it. Not
//! having reviewed yet today does not break a streak that runs through yesterday, but
//! today is only counted once a review has happened.

use chrono::{NaiveDate, TimeZone, Timelike};
use std::collections::HashSet;

/// Unique calendar days (in `tz`) on which at least one review happened.
pub fn review_days<Tz: TimeZone>(timestamps: &[i64], tz: &Tz) -> HashSet<NaiveDate> {
    timestamps
        .iter()
        .filter_map(|&ts| local_date(ts, tz))
        .collect()
}

/// Current streak length at `now`, bucketing days in `tz`.
pub fn current_streak<Tz: TimeZone>(timestamps: &[i64], now: i64, tz: &Tz) -> u32 {
    let days = review_days(timestamps, tz);
    let Some(today) = local_date(now, tz) else {
        return 0;
    };

    let mut streak = u32::from(days.contains(&today));
    let mut candidate = today.pred_opt();
    while let Some(day) = candidate {
        if !days.contains(&day) {
            break;
        }
        streak += 1;
        candidate = day.pred_opt();
    }
    streak
}

/// Epoch seconds of the start of the calendar day containing `now` in `tz`.
///
/// Midnight is resolved in `tz` itself, so the offset in effect at midnight is used
/// even when it changes later that day.
pub fn start_of_day<Tz: TimeZone>(now: i64, tz: &Tz) -> i64 {
    let Some(dt) = tz.timestamp_opt(now, 0).single() else {
        return now;
    };
    dt.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
        .map(|midnight| midnight.timestamp())
        // midnight skipped by a clock change
        .unwrap_or_else(|| now - i64::from(dt.time().num_seconds_from_midnight()))
}

fn local_date<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Option<NaiveDate> {
    tz.timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.date_naive())
}
