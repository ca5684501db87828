//! JSON backup of the phrase collection.
//! Saves phrases with their tags and scheduling state, and restores them into a database.

use crate::database::db::{begin_write, insert_phrase, insert_scheduling_state};
use crate::database::tags::attach_tag;
use crate::error::{Result, ReviewError};
use crate::models::{NewPhrase, PhraseDetails};
use rusqlite::Connection;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Outcome of restoring a backup.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped_duplicates: usize,
    pub skipped_invalid: usize,
}

/// Exports phrases to a pretty-printed JSON file at the specified path.
pub fn export_json_to_path(phrases: &[PhraseDetails], path: impl AsRef<Path>) -> Result<()> {
    let json_string = serde_json::to_string_pretty(phrases)?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(json_string.as_bytes())?;
    log::info!("Exported {} phrases to {}", phrases.len(), path.as_ref().display());
    Ok(())
}

/// Reads a JSON backup file.
/// Returns an error if the file doesn't exist or contains invalid JSON.
pub fn import_json(path: impl AsRef<Path>) -> Result<Vec<PhraseDetails>> {
    let mut file = File::open(path.as_ref())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let phrases: Vec<PhraseDetails> = serde_json::from_str(&contents)?;
    Ok(phrases)
}

/// Restores phrases into the database.
///
/// Each phrase keeps its creation time, tags and scheduling state. Phrases already
/// present for the same language pair are skipped, and so are phrases whose stored
/// scheduling state fails `SchedulingState::validate`.
pub fn restore_phrases(phrases: &[PhraseDetails], now: i64, conn: &Connection) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for details in phrases {
        if let Some(Err(e)) = details.srs.as_ref().map(|state| state.validate()) {
            log::warn!("Skipping phrase {:?}: {}", details.phrase.source_phrase, e);
            summary.skipped_invalid += 1;
            continue;
        }

        let new_phrase = NewPhrase {
            source_phrase: details.phrase.source_phrase.clone(),
            translation: details.phrase.translation.clone(),
            source_language: details.phrase.source_language.clone(),
            target_language: details.phrase.target_language.clone(),
        };

        let tx = begin_write(conn)?;
        let phrase_id = match insert_phrase(&new_phrase, details.phrase.created_at, &tx) {
            Ok(id) => id,
            Err(ReviewError::DuplicatePhrase) => {
                log::debug!("Skipping duplicate phrase {:?}", new_phrase.source_phrase);
                summary.skipped_duplicates += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        if let Some(state) = &details.srs {
            insert_scheduling_state(phrase_id, state, now, &tx)?;
        }
        for tag in &details.tags {
            if !tag.trim().is_empty() {
                attach_tag(phrase_id, tag.trim(), now, &tx)?;
            }
        }
        tx.commit()?;
        summary.imported += 1;
    }

    log::info!(
        "Restored {} phrases ({} duplicates, {} invalid skipped)",
        summary.imported,
        summary.skipped_duplicates,
        summary.skipped_invalid
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db::{apply_rating, get_phrase_details, list_phrases, open_in_memory, save_phrase};
    use crate::models::{Rating, SchedulingState};
    use std::fs;

    const NOW: i64 = 1_700_000_000;

    fn seeded_database() -> Connection {
        let conn = open_in_memory().unwrap();
        let hello = NewPhrase {
            source_phrase: "hello".to_string(),
            translation: "cześć".to_string(),
            source_language: "en".to_string(),
            target_language: "pl".to_string(),
        };
        let id = save_phrase(&hello, NOW, &conn).unwrap();
        apply_rating(id, Rating::Good, NOW + 60, &conn).unwrap();
        crate::database::tags::attach_tag(id, "greetings", NOW, &conn).unwrap();
        conn
    }

    #[test]
    fn test_export_json_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        let conn = seeded_database();

        export_json_to_path(&list_phrases(&conn).unwrap(), &path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"sourcePhrase\": \"hello\""));
        assert!(contents.contains("\"easeFactor\": 2.5"));
    }

    #[test]
    fn test_import_json() {
        let json_content = r#"[
  {
    "id": 3,
    "sourcePhrase": "thank you",
    "translation": "dziękuję",
    "sourceLanguage": "en",
    "targetLanguage": "pl",
    "createdAt": 100,
    "updatedAt": 100,
    "languagePair": "en-pl",
    "tags": ["en-pl", "manners"]
  }
]"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        fs::write(&path, json_content).unwrap();

        let phrases = import_json(&path).unwrap();
        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0].phrase.translation, "dziękuję");
        assert_eq!(phrases[0].tags, vec!["en-pl", "manners"]);
        assert!(phrases[0].srs.is_none());
    }

    #[test]
    fn test_restore_keeps_state_and_tags() {
        let source = seeded_database();
        let backup = list_phrases(&source).unwrap();

        let target = open_in_memory().unwrap();
        let summary = restore_phrases(&backup, NOW + 1000, &target).unwrap();
        assert_eq!(
            summary,
            ImportSummary { imported: 1, skipped_duplicates: 0, skipped_invalid: 0 }
        );

        let restored = list_phrases(&target).unwrap();
        assert_eq!(restored.len(), 1);
        let details = get_phrase_details(restored[0].phrase.id, &target).unwrap();
        assert_eq!(details.phrase.created_at, NOW);
        assert_eq!(details.tags, vec!["en-pl", "greetings"]);
        assert_eq!(details.srs, backup[0].srs);
    }

    #[test]
    fn test_restore_skips_duplicates() {
        let conn = seeded_database();
        let backup = list_phrases(&conn).unwrap();

        let summary = restore_phrases(&backup, NOW, &conn).unwrap();
        assert_eq!(summary.imported, 0);
        assert_eq!(summary.skipped_duplicates, 1);
        assert_eq!(list_phrases(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_restore_without_state_gets_fresh_one() {
        let conn = open_in_memory().unwrap();
        let mut backup = list_phrases(&seeded_database()).unwrap();
        backup[0].srs = None;

        restore_phrases(&backup, NOW + 5, &conn).unwrap();
        let restored = list_phrases(&conn).unwrap();
        assert_eq!(restored[0].srs, Some(SchedulingState::new(NOW)));
    }

    #[test]
    fn test_restore_skips_corrupt_scheduling_state() {
        let json_content = r#"[
  {
    "id": 1,
    "sourcePhrase": "good night",
    "translation": "dobranoc",
    "sourceLanguage": "en",
    "targetLanguage": "pl",
    "createdAt": 100,
    "updatedAt": 100,
    "languagePair": "en-pl",
    "tags": ["en-pl"],
    "srs": {
      "easeFactor": 0.2,
      "interval": -5,
      "repetitions": -3,
      "nextReviewDate": 100,
      "lastReviewDate": 50
    }
  }
]"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        fs::write(&path, json_content).unwrap();

        let conn = open_in_memory().unwrap();
        let mut backup = import_json(&path).unwrap();
        backup.extend(list_phrases(&seeded_database()).unwrap());

        let summary = restore_phrases(&backup, NOW, &conn).unwrap();
        assert_eq!(
            summary,
            ImportSummary { imported: 1, skipped_duplicates: 0, skipped_invalid: 1 }
        );

        let restored = list_phrases(&conn).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].phrase.source_phrase, "hello");
        let state = restored[0].srs.as_ref().unwrap();
        assert!(state.ease_factor >= 1.3);
        assert!(state.repetitions >= 0);
    }

    #[test]
    fn test_import_nonexistent_file() {
        assert!(import_json("nonexistent_file_xyz123.json").is_err());
    }

    #[test]
    fn test_import_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        assert!(matches!(import_json(&path), Err(ReviewError::Json(_))));
    }
}
