//! Command handlers for the CLI.
//! Each handler runs one operation against the phrase store and prints the result.

use anyhow::Context;
use chrono::{DateTime, Local, Utc};
use phrase_review::database::{db, stats, tags};
use phrase_review::export::{anki, json};
use phrase_review::models::language::{LANGUAGES, is_supported, language_name};
use phrase_review::models::sm2::format_interval;
use phrase_review::{NewPhrase, Phrase, PhraseDetails, Rating, ReviewSession, SchedulingState};
use rusqlite::Connection;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct App {
    conn: Arc<Mutex<Connection>>,
    fixed_now: Option<i64>,
    json: bool,
}

/// Formats epoch seconds as a local YYYY-MM-DD HH:MM string
fn format_timestamp(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(utc) => utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => timestamp.to_string(),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_phrase_line(phrase: &Phrase) {
    println!(
        "{:>5}  [{}]  {}  =>  {}",
        phrase.id,
        phrase.language_pair(),
        phrase.source_phrase,
        phrase.translation
    );
}

fn print_state(state: &SchedulingState) {
    println!(
        "  ease {:.2}, interval {}, repetitions {}",
        state.ease_factor,
        format_interval(state.interval),
        state.repetitions
    );
    println!("  next review: {}", format_timestamp(state.next_review_date));
    match state.last_review_date {
        Some(last) => println!("  last review: {}", format_timestamp(last)),
        None => println!("  last review: never"),
    }
}

impl App {
    pub fn new(conn: Connection, fixed_now: Option<i64>, json: bool) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            fixed_now,
            json,
        }
    }

    fn now(&self) -> i64 {
        self.fixed_now.unwrap_or_else(|| Utc::now().timestamp())
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection lock poisoned"))
    }

    pub fn add(
        &self,
        source: &str,
        translation: &str,
        from: &str,
        to: &str,
        extra_tags: Option<&str>,
    ) -> anyhow::Result<()> {
        for code in [from, to] {
            if !is_supported(code) {
                eprintln!("warning: '{}' is not a known language code", code);
            }
        }

        let conn = self.conn()?;
        let new_phrase = NewPhrase {
            source_phrase: source.to_string(),
            translation: translation.to_string(),
            source_language: from.to_string(),
            target_language: to.to_string(),
        };
        let extra: Vec<String> = extra_tags
            .map(|list| list.split(',').map(str::to_string).collect())
            .unwrap_or_default();
        let id = db::save_phrase_with_tags(&new_phrase, &extra, self.now(), &conn)?;

        if self.json {
            print_json(&db::get_phrase_details(id, &conn)?)
        } else {
            println!(
                "Saved phrase {} ({} -> {})",
                id,
                language_name(from),
                language_name(to)
            );
            Ok(())
        }
    }

    pub fn list(&self, tag: Option<&str>) -> anyhow::Result<()> {
        let conn = self.conn()?;
        let phrases: Vec<PhraseDetails> = match tag {
            Some(name) => tags::list_phrases_by_tag(name, &conn)?
                .into_iter()
                .map(|p| db::get_phrase_details(p.id, &conn))
                .collect::<phrase_review::Result<_>>()?,
            None => db::list_phrases(&conn)?,
        };

        if self.json {
            return print_json(&phrases);
        }
        if phrases.is_empty() {
            println!("No phrases saved yet.");
        }
        for details in &phrases {
            print_phrase_line(&details.phrase);
            if !details.tags.is_empty() {
                println!("       tags: {}", details.tags.join(", "));
            }
        }
        Ok(())
    }

    pub fn show(&self, id: i64) -> anyhow::Result<()> {
        let conn = self.conn()?;
        let details = db::get_phrase_details(id, &conn)?;
        if self.json {
            return print_json(&details);
        }

        print_phrase_line(&details.phrase);
        println!(
            "  {} -> {}, saved {}",
            language_name(&details.phrase.source_language),
            language_name(&details.phrase.target_language),
            format_timestamp(details.phrase.created_at)
        );
        println!("  tags: {}", details.tags.join(", "));
        match &details.srs {
            Some(state) => print_state(state),
            None => println!("  not scheduled"),
        }
        Ok(())
    }

    pub fn edit(&self, id: i64, translation: &str) -> anyhow::Result<()> {
        let conn = self.conn()?;
        db::update_translation(id, translation, self.now(), &conn)?;
        if self.json {
            return print_json(&db::get_phrase_details(id, &conn)?);
        }
        println!("Updated phrase {}", id);
        Ok(())
    }

    pub fn delete(&self, id: i64) -> anyhow::Result<()> {
        let conn = self.conn()?;
        db::delete_phrase(id, &conn)?;
        if self.json {
            return print_json(&serde_json::json!({ "deleted": id }));
        }
        println!("Deleted phrase {}", id);
        Ok(())
    }

    pub fn tags(&self) -> anyhow::Result<()> {
        let conn = self.conn()?;
        let summaries = tags::list_tags(&conn)?;
        if self.json {
            return print_json(&summaries);
        }
        for summary in &summaries {
            println!(
                "{:>5}  {} ({})",
                summary.tag.id, summary.tag.name, summary.phrase_count
            );
        }
        Ok(())
    }

    pub fn set_tags(&self, id: i64, names: &[String]) -> anyhow::Result<()> {
        let conn = self.conn()?;
        let result = tags::set_phrase_tags(id, names, self.now(), &conn)?;
        if self.json {
            print_json(&result)
        } else {
            println!("Phrase {} tags: {}", id, result.join(", "));
            Ok(())
        }
    }

    pub fn untag(&self, id: i64, tag_id: i64) -> anyhow::Result<()> {
        let conn = self.conn()?;
        tags::remove_tag_from_phrase(id, tag_id, &conn)?;
        if self.json {
            return print_json(&db::get_phrase_details(id, &conn)?);
        }
        println!("Removed tag {} from phrase {}", tag_id, id);
        Ok(())
    }

    pub fn due(&self) -> anyhow::Result<()> {
        let conn = self.conn()?;
        let due = db::list_due(self.now(), &conn)?;
        if self.json {
            let phrases: Vec<&Phrase> = due.iter().map(|(phrase, _)| phrase).collect();
            return print_json(&phrases);
        }
        println!("{} cards due", due.len());
        for (phrase, state) in &due {
            print_phrase_line(phrase);
            println!("       due since {}", format_timestamp(state.next_review_date));
        }
        Ok(())
    }

    pub fn rate(&self, id: i64, rating: &str) -> anyhow::Result<()> {
        let rating: Rating = rating.parse()?;
        let conn = self.conn()?;
        let next = db::apply_rating(id, rating, self.now(), &conn)?;
        if self.json {
            return print_json(&next);
        }
        println!("Rated phrase {} as {}", id, rating);
        print_state(&next);
        Ok(())
    }

    /// Interactive review of the due cards on stdin/stdout.
    pub fn review(&self) -> anyhow::Result<()> {
        let mut session = ReviewSession::start(self.now(), Arc::clone(&self.conn))?;
        if session.is_completed() {
            println!("Nothing due. Come back later!");
            return Ok(());
        }

        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        let mut stdout = io::stdout();
        let mut last_round = 0;

        while let Some((phrase, _)) = session.current_card().cloned() {
            if session.round_number != last_round {
                println!("\n{}", session.phase_message());
                last_round = session.round_number;
            }

            println!("\n[{}] {}", phrase.language_pair(), phrase.source_phrase);
            print!("(press Enter to show the translation, q to quit) ");
            stdout.flush()?;
            match lines.next().transpose()? {
                Some(line) if line.trim() == "q" => break,
                Some(_) => {}
                None => break,
            }
            session.toggle_translation();
            println!("  {}", phrase.translation);

            let labels: Vec<String> = session
                .preview_current(self.now())
                .unwrap_or_default()
                .iter()
                .map(|&days| format_interval(days))
                .collect();
            let rating = loop {
                print!(
                    "[a]gain {} / [h]ard {} / [g]ood {} / [e]asy {}: ",
                    labels[0], labels[1], labels[2], labels[3]
                );
                stdout.flush()?;
                let Some(line) = lines.next().transpose()? else {
                    return Ok(());
                };
                match line.trim() {
                    "a" => break Rating::Again,
                    "h" => break Rating::Hard,
                    "g" => break Rating::Good,
                    "e" => break Rating::Easy,
                    other => match other.parse::<Rating>() {
                        Ok(rating) => break rating,
                        Err(e) => println!("{}", e),
                    },
                }
            };

            let next = session.rate_current_card(rating, self.now())?;
            println!("  next review in {}", format_interval(next.interval));
        }

        println!(
            "\nSession finished: {} reviews, {} cards still in the queue",
            session.reviews_done(),
            session.remaining_count()
        );
        Ok(())
    }

    pub fn stats(&self) -> anyhow::Result<()> {
        let conn = self.conn()?;
        let stats = stats::review_stats(self.now(), &Local, &conn)?;
        if self.json {
            return print_json(&stats);
        }
        println!("Total cards:      {}", stats.total_cards);
        println!("Due now:          {}", stats.cards_due_today);
        println!("Reviewed today:   {}", stats.cards_reviewed_today);
        println!("Streak:           {} days", stats.streak);
        match stats.last_review_date {
            Some(last) => println!("Last review:      {}", format_timestamp(last)),
            None => println!("Last review:      never"),
        }
        Ok(())
    }

    pub fn export_anki(&self, path: &Path) -> anyhow::Result<()> {
        let conn = self.conn()?;
        let phrases = db::list_phrases(&conn)?;
        anki::export_anki_to_path(&phrases, path)
            .with_context(|| format!("exporting to {}", path.display()))?;
        self.print_export_summary(phrases.len(), path)
    }

    pub fn export_json(&self, path: &Path) -> anyhow::Result<()> {
        let conn = self.conn()?;
        let phrases = db::list_phrases(&conn)?;
        json::export_json_to_path(&phrases, path)
            .with_context(|| format!("exporting to {}", path.display()))?;
        self.print_export_summary(phrases.len(), path)
    }

    fn print_export_summary(&self, exported: usize, path: &Path) -> anyhow::Result<()> {
        if self.json {
            return print_json(&serde_json::json!({
                "exported": exported,
                "path": path.display().to_string(),
            }));
        }
        println!("Exported {} phrases to {}", exported, path.display());
        Ok(())
    }

    pub fn import_json(&self, path: &Path) -> anyhow::Result<()> {
        let phrases =
            json::import_json(path).with_context(|| format!("reading {}", path.display()))?;
        let conn = self.conn()?;
        let summary = json::restore_phrases(&phrases, self.now(), &conn)?;
        if self.json {
            return print_json(&summary);
        }
        println!(
            "Imported {} phrases ({} duplicates, {} with invalid review state skipped)",
            summary.imported, summary.skipped_duplicates, summary.skipped_invalid
        );
        Ok(())
    }

    pub fn languages(&self) -> anyhow::Result<()> {
        if self.json {
            let languages: Vec<_> = LANGUAGES
                .iter()
                .map(|(code, name)| serde_json::json!({ "code": code, "name": name }))
                .collect();
            return print_json(&languages);
        }
        for (code, name) in LANGUAGES {
            println!("{}  {}", code, name);
        }
        Ok(())
    }
}
