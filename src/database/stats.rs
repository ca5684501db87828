//! Review statistics for the dashboard.

use super::db::list_last_review_dates;
use crate::error::Result;
use crate::models::ReviewStats;
use crate::models::streak::{current_streak, start_of_day};
use chrono::TimeZone;
use rusqlite::{Connection, params};

/// Computes review statistics at `now`, using `tz` for calendar days.
pub fn review_stats<Tz: TimeZone>(now: i64, tz: &Tz, conn: &Connection) -> Result<ReviewStats> {
    let total_cards: i64 = conn.query_row("SELECT COUNT(*) FROM phrases", [], |row| row.get(0))?;

    let cards_due_today: i64 = conn.query_row(
        "SELECT COUNT(*) FROM phrases p JOIN srs_data s ON p.id = s.phrase_id
         WHERE s.next_review_date <= ?1",
        params![now],
        |row| row.get(0),
    )?;

    let cards_reviewed_today: i64 = conn.query_row(
        "SELECT COUNT(*) FROM srs_data WHERE last_review_date >= ?1",
        params![start_of_day(now, tz)],
        |row| row.get(0),
    )?;

    let review_dates = list_last_review_dates(conn)?;

    Ok(ReviewStats {
        total_cards: total_cards as usize,
        cards_due_today: cards_due_today as usize,
        cards_reviewed_today: cards_reviewed_today as usize,
        streak: current_streak(&review_dates, now, tz),
        last_review_date: review_dates.first().copied(),
    })
}
