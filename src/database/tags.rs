//! Tag operations: tags are shared by name and linked to phrases many-to-many.

use super::db::{begin_write, get_phrase};
use crate::error::{Result, ReviewError};
use crate::models::{Phrase, Tag, TagSummary};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeSet;

/// Returns the ID of the tag called `name`, creating it if needed.
pub fn get_or_create_tag(name: &str, now: i64, conn: &Connection) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| row.get(0))
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    conn.execute(
        "INSERT INTO tags (name, created_at) VALUES (?1, ?2)",
        params![name, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Links a phrase to the tag `name` (created on demand). Linking twice is a no-op.
pub fn attach_tag(phrase_id: i64, name: &str, now: i64, conn: &Connection) -> Result<()> {
    let tag_id = get_or_create_tag(name, now, conn)?;
    conn.execute(
        "INSERT OR IGNORE INTO phrase_tags (phrase_id, tag_id, created_at) VALUES (?1, ?2, ?3)",
        params![phrase_id, tag_id, now],
    )?;
    Ok(())
}

/// Tags of a phrase, sorted by name.
pub fn tags_for_phrase(phrase_id: i64, conn: &Connection) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.created_at
         FROM tags t
         JOIN phrase_tags pt ON t.id = pt.tag_id
         WHERE pt.phrase_id = ?1
         ORDER BY t.name ASC",
    )?;
    let tags = stmt
        .query_map(params![phrase_id], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<Tag>>>()?;
    Ok(tags)
}

/// Replaces the tags of a phrase with `tag_names`.
///
/// Names are trimmed and blank ones ignored. Missing links are added, links not in
/// the new set are removed; tags themselves are never deleted. Returns the resulting
/// tag names in sorted order.
pub fn set_phrase_tags(
    phrase_id: i64,
    tag_names: &[String],
    now: i64,
    conn: &Connection,
) -> Result<Vec<String>> {
    let tx = begin_write(conn)?;
    get_phrase(phrase_id, &tx)?;

    let wanted: BTreeSet<String> = tag_names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    let current = tags_for_phrase(phrase_id, &tx)?;
    for tag in &current {
        if !wanted.contains(&tag.name) {
            tx.execute(
                "DELETE FROM phrase_tags WHERE phrase_id = ?1 AND tag_id = ?2",
                params![phrase_id, tag.id],
            )?;
        }
    }
    for name in &wanted {
        if !current.iter().any(|tag| &tag.name == name) {
            attach_tag(phrase_id, name, now, &tx)?;
        }
    }
    tx.commit()?;

    log::debug!("Phrase {} tagged with {:?}", phrase_id, wanted);
    Ok(wanted.into_iter().collect())
}

/// Removes a single tag from a phrase.
pub fn remove_tag_from_phrase(phrase_id: i64, tag_id: i64, conn: &Connection) -> Result<()> {
    let removed = conn.execute(
        "DELETE FROM phrase_tags WHERE phrase_id = ?1 AND tag_id = ?2",
        params![phrase_id, tag_id],
    )?;
    if removed == 0 {
        return Err(ReviewError::TagLinkNotFound { phrase_id, tag_id });
    }
    Ok(())
}

/// All tags with the number of phrases carrying each, sorted by name.
pub fn list_tags(conn: &Connection) -> Result<Vec<TagSummary>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.created_at, COUNT(pt.phrase_id)
         FROM tags t
         LEFT JOIN phrase_tags pt ON t.id = pt.tag_id
         GROUP BY t.id
         ORDER BY t.name ASC",
    )?;
    let tags = stmt
        .query_map([], |row| {
            Ok(TagSummary {
                tag: Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                },
                phrase_count: row.get::<_, i64>(3)? as usize,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tags)
}

/// Phrases carrying the tag `name`, newest first.
pub fn list_phrases_by_tag(name: &str, conn: &Connection) -> Result<Vec<Phrase>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.source_phrase, p.translation, p.source_language, p.target_language,
                p.created_at, p.updated_at
         FROM phrases p
         JOIN phrase_tags pt ON p.id = pt.phrase_id
         JOIN tags t ON t.id = pt.tag_id
         WHERE t.name = ?1
         ORDER BY p.created_at DESC, p.id ASC",
    )?;
    let phrases = stmt
        .query_map(params![name], |row| {
            Ok(Phrase {
                id: row.get(0)?,
                source_phrase: row.get(1)?,
                translation: row.get(2)?,
                source_language: row.get(3)?,
                target_language: row.get(4)?,
                created_at: row.get(5)?,
                updated_at: row.get(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<Phrase>>>()?;
    Ok(phrases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db::{open_in_memory, save_phrase};
    use crate::models::NewPhrase;

    const NOW: i64 = 1_700_000_000;

    fn add(source: &str, conn: &Connection) -> i64 {
        let new_phrase = NewPhrase {
            source_phrase: source.to_string(),
            translation: format!("{}-es", source),
            source_language: "en".to_string(),
            target_language: "es".to_string(),
        };
        save_phrase(&new_phrase, NOW, conn).unwrap()
    }

    fn names(phrase_id: i64, conn: &Connection) -> Vec<String> {
        tags_for_phrase(phrase_id, conn)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect()
    }

    #[test]
    fn test_set_phrase_tags_adds_and_removes() {
        let conn = open_in_memory().unwrap();
        let id = add("hello", &conn);

        let result = set_phrase_tags(
            id,
            &["greetings".to_string(), " basics ".to_string(), "".to_string()],
            NOW,
            &conn,
        )
        .unwrap();
        assert_eq!(result, vec!["basics".to_string(), "greetings".to_string()]);
        assert_eq!(names(id, &conn), vec!["basics", "greetings"]);

        set_phrase_tags(id, &["greetings".to_string(), "travel".to_string()], NOW, &conn).unwrap();
        assert_eq!(names(id, &conn), vec!["greetings", "travel"]);

        // Removed links leave the tag itself in place
        let all: Vec<String> = list_tags(&conn).unwrap().into_iter().map(|t| t.tag.name).collect();
        assert!(all.contains(&"basics".to_string()));
    }

    #[test]
    fn test_set_tags_on_missing_phrase() {
        let conn = open_in_memory().unwrap();
        let err = set_phrase_tags(7, &["x".to_string()], NOW, &conn).unwrap_err();
        assert!(matches!(err, ReviewError::PhraseNotFound(7)));
    }

    #[test]
    fn test_tags_are_shared_between_phrases() {
        let conn = open_in_memory().unwrap();
        let a = add("hello", &conn);
        let b = add("bye", &conn);
        set_phrase_tags(a, &["common".to_string()], NOW, &conn).unwrap();
        set_phrase_tags(b, &["common".to_string(), "en-es".to_string()], NOW, &conn).unwrap();

        let tags = list_tags(&conn).unwrap();
        let common = tags.iter().find(|t| t.tag.name == "common").unwrap();
        assert_eq!(common.phrase_count, 2);
        let pair = tags.iter().find(|t| t.tag.name == "en-es").unwrap();
        assert_eq!(pair.phrase_count, 1);

        let tagged: Vec<i64> = list_phrases_by_tag("common", &conn)
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(tagged, vec![a, b]);
    }

    #[test]
    fn test_remove_tag_from_phrase() {
        let conn = open_in_memory().unwrap();
        let id = add("hello", &conn);
        let tag = tags_for_phrase(id, &conn).unwrap().remove(0);

        remove_tag_from_phrase(id, tag.id, &conn).unwrap();
        assert!(names(id, &conn).is_empty());

        let err = remove_tag_from_phrase(id, tag.id, &conn).unwrap_err();
        assert!(matches!(err, ReviewError::TagLinkNotFound { .. }));
    }

    #[test]
    fn test_attach_tag_twice_is_noop() {
        let conn = open_in_memory().unwrap();
        let id = add("hello", &conn);
        attach_tag(id, "extra", NOW, &conn).unwrap();
        attach_tag(id, "extra", NOW, &conn).unwrap();
        assert_eq!(names(id, &conn), vec!["en-es", "extra"]);
    }
}
