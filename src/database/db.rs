//! Database operations for the phrase store
//!
//! Handles SQLite schema initialization, phrase CRUD and the persisted
//! spaced repetition state. Every time-dependent call takes `now` explicitly.

use super::tags::{attach_tag, tags_for_phrase};
use crate::error::{Result, ReviewError};
use crate::models::scheduling_state::{ease_factor_from_stored, ease_factor_to_stored};
use crate::models::{
    NewPhrase, Phrase, PhraseDetails, Rating, SchedulingState, due::select_due, phrase::language_pair,
    sm2::calculate_next_review,
};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use std::path::Path;

const PHRASE_COLUMNS: &str =
    "p.id, p.source_phrase, p.translation, p.source_language, p.target_language, p.created_at, p.updated_at";

const STATE_COLUMNS: &str =
    "s.ease_factor, s.interval_days, s.repetitions, s.next_review_date, s.last_review_date";

/// Opens (or creates) the SQLite database at `path` and makes sure the schema exists.
pub fn init_database(path: impl AsRef<Path>) -> Result<Connection> {
    let conn = Connection::open(path.as_ref())?;
    init_schema(&conn)?;
    log::info!("Opened phrase database at {}", path.as_ref().display());
    Ok(conn)
}

/// In-memory database with the schema applied.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Creates tables for phrases, tags, phrase-tag links and scheduling state.
///
/// Idempotent: safe to run on every startup.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS phrases (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source_phrase TEXT NOT NULL,
            translation TEXT NOT NULL,
            source_language TEXT NOT NULL,
            target_language TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE(source_phrase, source_language, target_language)
        );

        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS phrase_tags (
            phrase_id INTEGER NOT NULL,
            tag_id INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (phrase_id, tag_id),
            FOREIGN KEY (phrase_id) REFERENCES phrases(id) ON DELETE CASCADE,
            FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
        );

        -- ease_factor is stored x100 (250 = 2.5)
        CREATE TABLE IF NOT EXISTS srs_data (
            phrase_id INTEGER PRIMARY KEY,
            ease_factor INTEGER NOT NULL DEFAULT 250,
            interval_days INTEGER NOT NULL DEFAULT 0,
            repetitions INTEGER NOT NULL DEFAULT 0,
            next_review_date INTEGER NOT NULL,
            last_review_date INTEGER,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY (phrase_id) REFERENCES phrases(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_srs_next_review ON srs_data(next_review_date);",
    )?;
    Ok(())
}

/// Starts a write transaction that takes the database write lock immediately,
/// so a read-modify-write inside it cannot interleave with another writer.
pub(crate) fn begin_write(conn: &Connection) -> Result<Transaction<'_>> {
    Ok(Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?)
}

fn phrase_from_row(row: &Row) -> rusqlite::Result<Phrase> {
    Ok(Phrase {
        id: row.get(0)?,
        source_phrase: row.get(1)?,
        translation: row.get(2)?,
        source_language: row.get(3)?,
        target_language: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Reads a scheduling state whose columns start at `offset`.
fn state_from_row(row: &Row, offset: usize) -> rusqlite::Result<SchedulingState> {
    Ok(SchedulingState {
        ease_factor: ease_factor_from_stored(row.get(offset)?),
        interval: row.get(offset + 1)?,
        repetitions: row.get(offset + 2)?,
        next_review_date: row.get(offset + 3)?,
        last_review_date: row.get(offset + 4)?,
    })
}

fn validate_new_phrase(new_phrase: &NewPhrase) -> Result<NewPhrase> {
    let fields = [
        ("source phrase", &new_phrase.source_phrase),
        ("translation", &new_phrase.translation),
        ("source language", &new_phrase.source_language),
        ("target language", &new_phrase.target_language),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(ReviewError::InvalidInput(format!("{} must not be empty", name)));
        }
    }

    Ok(NewPhrase {
        source_phrase: new_phrase.source_phrase.trim().to_string(),
        translation: new_phrase.translation.trim().to_string(),
        source_language: new_phrase.source_language.trim().to_string(),
        target_language: new_phrase.target_language.trim().to_string(),
    })
}

/// Looks up a phrase by its (source phrase, language pair) identity.
pub fn find_phrase_id(
    source_phrase: &str,
    source_language: &str,
    target_language: &str,
    conn: &Connection,
) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM phrases
             WHERE source_phrase = ?1 AND source_language = ?2 AND target_language = ?3",
            params![source_phrase, source_language, target_language],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Inserts the phrase, its initial scheduling state and its language-pair tag.
/// Runs inside the caller's transaction.
pub(crate) fn insert_phrase(new_phrase: &NewPhrase, now: i64, conn: &Connection) -> Result<i64> {
    let new_phrase = validate_new_phrase(new_phrase)?;

    if find_phrase_id(
        &new_phrase.source_phrase,
        &new_phrase.source_language,
        &new_phrase.target_language,
        conn,
    )?
    .is_some()
    {
        return Err(ReviewError::DuplicatePhrase);
    }

    conn.execute(
        "INSERT INTO phrases (source_phrase, translation, source_language, target_language, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            new_phrase.source_phrase,
            new_phrase.translation,
            new_phrase.source_language,
            new_phrase.target_language,
            now
        ],
    )?;
    let phrase_id = conn.last_insert_rowid();

    // New phrases are due right away
    insert_scheduling_state(phrase_id, &SchedulingState::new(now), now, conn)?;

    let pair = language_pair(&new_phrase.source_language, &new_phrase.target_language);
    attach_tag(phrase_id, &pair, now, conn)?;

    Ok(phrase_id)
}

/// Saves a new phrase and returns its ID.
///
/// The phrase gets a fresh scheduling state due at `now` and is tagged with its
/// language pair (e.g. "en-es"). Fails with `DuplicatePhrase` if the same source
/// phrase is already saved for this language pair.
pub fn save_phrase(new_phrase: &NewPhrase, now: i64, conn: &Connection) -> Result<i64> {
    save_phrase_with_tags(new_phrase, &[], now, conn)
}

/// Saves a new phrase together with extra tags in one transaction.
///
/// Tag names are trimmed and blank ones ignored. If any tag cannot be attached,
/// nothing is saved.
pub fn save_phrase_with_tags(
    new_phrase: &NewPhrase,
    tag_names: &[String],
    now: i64,
    conn: &Connection,
) -> Result<i64> {
    let tx = begin_write(conn)?;
    let phrase_id = insert_phrase(new_phrase, now, &tx)?;
    for name in tag_names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        attach_tag(phrase_id, name, now, &tx)?;
    }
    tx.commit()?;

    log::info!(
        "Saved phrase {} ({}-{})",
        phrase_id,
        new_phrase.source_language.trim(),
        new_phrase.target_language.trim()
    );
    Ok(phrase_id)
}

pub fn get_phrase(phrase_id: i64, conn: &Connection) -> Result<Phrase> {
    conn.query_row(
        &format!("SELECT {} FROM phrases p WHERE p.id = ?1", PHRASE_COLUMNS),
        params![phrase_id],
        phrase_from_row,
    )
    .optional()?
    .ok_or(ReviewError::PhraseNotFound(phrase_id))
}

/// Updates the translation text of a phrase.
pub fn update_translation(phrase_id: i64, translation: &str, now: i64, conn: &Connection) -> Result<()> {
    if translation.trim().is_empty() {
        return Err(ReviewError::InvalidInput("translation must not be empty".to_string()));
    }
    let changed = conn.execute(
        "UPDATE phrases SET translation = ?1, updated_at = ?2 WHERE id = ?3",
        params![translation.trim(), now, phrase_id],
    )?;
    if changed == 0 {
        return Err(ReviewError::PhraseNotFound(phrase_id));
    }
    Ok(())
}

fn details_for(phrase: Phrase, conn: &Connection) -> Result<PhraseDetails> {
    let tags = tags_for_phrase(phrase.id, conn)?
        .into_iter()
        .map(|tag| tag.name)
        .collect();
    let srs = get_scheduling_state(phrase.id, conn)?;
    Ok(PhraseDetails {
        language_pair: phrase.language_pair(),
        phrase,
        tags,
        srs,
    })
}

/// Phrase with its tags and scheduling state.
pub fn get_phrase_details(phrase_id: i64, conn: &Connection) -> Result<PhraseDetails> {
    let phrase = get_phrase(phrase_id, conn)?;
    details_for(phrase, conn)
}

/// All phrases, newest first (ties broken by ID).
pub fn list_phrases(conn: &Connection) -> Result<Vec<PhraseDetails>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM phrases p ORDER BY p.created_at DESC, p.id ASC",
        PHRASE_COLUMNS
    ))?;
    let phrases = stmt
        .query_map([], phrase_from_row)?
        .collect::<rusqlite::Result<Vec<Phrase>>>()?;

    phrases
        .into_iter()
        .map(|phrase| details_for(phrase, conn))
        .collect()
}

/// Deletes a phrase; its scheduling state and tag links go with it.
pub fn delete_phrase(phrase_id: i64, conn: &Connection) -> Result<()> {
    let deleted = conn.execute("DELETE FROM phrases WHERE id = ?1", params![phrase_id])?;
    if deleted == 0 {
        return Err(ReviewError::PhraseNotFound(phrase_id));
    }
    log::info!("Deleted phrase {}", phrase_id);
    Ok(())
}

// ==================== Scheduling state ====================

/// Stores `state` for a phrase, replacing any existing state.
pub fn insert_scheduling_state(
    phrase_id: i64,
    state: &SchedulingState,
    now: i64,
    conn: &Connection,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO srs_data
            (phrase_id, ease_factor, interval_days, repetitions, next_review_date, last_review_date, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            phrase_id,
            ease_factor_to_stored(state.ease_factor),
            state.interval,
            state.repetitions,
            state.next_review_date,
            state.last_review_date,
            now
        ],
    )?;
    Ok(())
}

pub fn get_scheduling_state(phrase_id: i64, conn: &Connection) -> Result<Option<SchedulingState>> {
    let state = conn
        .query_row(
            &format!("SELECT {} FROM srs_data s WHERE s.phrase_id = ?1", STATE_COLUMNS),
            params![phrase_id],
            |row| state_from_row(row, 0),
        )
        .optional()?;
    Ok(state)
}

/// Applies a rating to a phrase's scheduling state and persists the result.
///
/// Read, compute and write happen in one immediate transaction, so concurrent
/// ratings of the same phrase are serialized rather than computed from a stale
/// state. Fails with `MissingState` when the phrase has no scheduling state.
pub fn apply_rating(phrase_id: i64, rating: Rating, now: i64, conn: &Connection) -> Result<SchedulingState> {
    let tx = begin_write(conn)?;

    let current = get_scheduling_state(phrase_id, &tx)?.ok_or(ReviewError::MissingState(phrase_id))?;
    let next = calculate_next_review(&current, rating, now);

    tx.execute(
        "UPDATE srs_data
         SET ease_factor = ?1, interval_days = ?2, repetitions = ?3,
             next_review_date = ?4, last_review_date = ?5, updated_at = ?6
         WHERE phrase_id = ?7",
        params![
            ease_factor_to_stored(next.ease_factor),
            next.interval,
            next.repetitions,
            next.next_review_date,
            next.last_review_date,
            now,
            phrase_id
        ],
    )?;
    tx.commit()?;

    log::debug!(
        "Rated phrase {} as {}: interval {} -> {} days, ease {:.2} -> {:.2}",
        phrase_id,
        rating,
        current.interval,
        next.interval,
        current.ease_factor,
        next.ease_factor
    );
    Ok(next)
}

/// All scheduling states, oldest due first.
pub fn list_scheduling_states(conn: &Connection) -> Result<Vec<(i64, SchedulingState)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT s.phrase_id, {} FROM srs_data s ORDER BY s.next_review_date ASC, s.phrase_id ASC",
        STATE_COLUMNS
    ))?;
    let states = stmt
        .query_map([], |row| Ok((row.get(0)?, state_from_row(row, 1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(states)
}

/// IDs of phrases due at `now`, oldest due first.
pub fn list_due_ids(now: i64, conn: &Connection) -> Result<Vec<i64>> {
    let states = list_scheduling_states(conn)?;
    Ok(select_due(states.iter().map(|(id, state)| (*id, state)), now))
}

/// Phrases due for review at `now` (next_review_date <= now), oldest due first.
pub fn list_due(now: i64, conn: &Connection) -> Result<Vec<(Phrase, SchedulingState)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {}, {}
         FROM phrases p
         JOIN srs_data s ON p.id = s.phrase_id
         WHERE s.next_review_date <= ?1
         ORDER BY s.next_review_date ASC, p.id ASC",
        PHRASE_COLUMNS, STATE_COLUMNS
    ))?;
    let due = stmt
        .query_map(params![now], |row| Ok((phrase_from_row(row)?, state_from_row(row, 7)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(due)
}

/// Every recorded last-review timestamp, most recent first.
pub fn list_last_review_dates(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT last_review_date FROM srs_data
         WHERE last_review_date IS NOT NULL
         ORDER BY last_review_date DESC",
    )?;
    let dates = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(dates)
}
