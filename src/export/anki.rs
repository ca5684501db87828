//! Anki-importable CSV export.
//!
//! Layout: UTF-8 BOM, a `Source Phrase,Translation,Tags` header, then one row per
//! phrase with every field quoted and the phrase's tags joined by commas.

use crate::error::Result;
use crate::models::PhraseDetails;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const ANKI_EXPORT_FILE_NAME: &str = "phrases_anki_export.csv";

const UTF8_BOM: &str = "\u{FEFF}";
const HEADER: &str = "Source Phrase,Translation,Tags";

/// Writes the CSV export of `phrases` to `writer`, keeping the given order.
pub fn write_anki_csv<W: Write>(phrases: &[PhraseDetails], mut writer: W) -> Result<()> {
    writeln!(writer, "{}{}", UTF8_BOM, HEADER)?;

    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    for details in phrases {
        let tags = details.tags.join(",");
        csv_writer.write_record([
            details.phrase.source_phrase.as_str(),
            details.phrase.translation.as_str(),
            tags.as_str(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Exports `phrases` as an Anki CSV file at `path`.
pub fn export_anki_to_path(phrases: &[PhraseDetails], path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_anki_csv(phrases, BufWriter::new(file))?;
    log::info!("Exported {} phrases for Anki to {}", phrases.len(), path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Phrase;

    fn details(source: &str, translation: &str, tags: &[&str]) -> PhraseDetails {
        PhraseDetails {
            phrase: Phrase {
                id: 1,
                source_phrase: source.to_string(),
                translation: translation.to_string(),
                source_language: "en".to_string(),
                target_language: "fr".to_string(),
                created_at: 0,
                updated_at: 0,
            },
            language_pair: "en-fr".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            srs: None,
        }
    }

    fn render(phrases: &[PhraseDetails]) -> String {
        let mut out = Vec::new();
        write_anki_csv(phrases, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_header_and_bom() {
        assert_eq!(render(&[]), "\u{FEFF}Source Phrase,Translation,Tags\n");
    }

    #[test]
    fn test_rows_are_quoted_and_tags_joined() {
        let csv = render(&[
            details("good morning", "bonjour", &["en-fr", "greetings"]),
            details("see you", "à bientôt", &[]),
        ]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[1], r#""good morning","bonjour","en-fr,greetings""#);
        assert_eq!(lines[2], r#""see you","à bientôt","""#);
    }

    #[test]
    fn test_quotes_are_doubled() {
        let csv = render(&[details(r#"say "hi""#, r#"dis "salut", ok"#, &["x"])]);
        assert!(csv.ends_with("\"say \"\"hi\"\"\",\"dis \"\"salut\"\", ok\",\"x\"\n"));
    }

    #[test]
    fn test_export_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ANKI_EXPORT_FILE_NAME);
        export_anki_to_path(&[details("cat", "chat", &["animals"])], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with('\u{FEFF}'));
        assert!(contents.contains(r#""cat","chat","animals""#));
    }
}
