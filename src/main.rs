mod app;

use app::App;
use clap::{Parser, Subcommand};
use phrase_review::database::db::init_database;
use phrase_review::export::anki::ANKI_EXPORT_FILE_NAME;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "phrase-review", about = "Saved phrases with spaced repetition review", version)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "PHRASE_REVIEW_DB", default_value = "phrases.sqlite3")]
    db: PathBuf,

    /// Override the current time (seconds since the Unix epoch)
    #[arg(long, global = true)]
    now: Option<i64>,

    /// Print JSON instead of plain text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save a translated phrase
    Add {
        /// Phrase in the source language
        source: String,
        /// Its translation
        translation: String,
        /// Source language code
        #[arg(long, default_value = "en")]
        from: String,
        /// Target language code
        #[arg(long)]
        to: String,
        /// Comma-separated extra tags
        #[arg(long)]
        tags: Option<String>,
    },

    /// List saved phrases
    List {
        /// Only phrases carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Show a phrase with its tags and review state
    Show { id: i64 },

    /// Change the translation of a phrase
    Edit { id: i64, translation: String },

    /// Delete a phrase and its review state
    Delete { id: i64 },

    /// List tags with phrase counts
    Tags,

    /// Replace the tags of a phrase
    Tag {
        id: i64,
        /// New tag set (empty to clear)
        tags: Vec<String>,
    },

    /// Remove one tag from a phrase
    Untag { id: i64, tag_id: i64 },

    /// List phrases due for review
    Due,

    /// Rate a phrase: again, hard, good or easy
    Rate { id: i64, rating: String },

    /// Review due phrases interactively
    Review,

    /// Show review statistics
    Stats,

    /// Export phrases as an Anki CSV file
    ExportAnki {
        #[arg(default_value = ANKI_EXPORT_FILE_NAME)]
        path: PathBuf,
    },

    /// Back up phrases to a JSON file
    ExportJson { path: PathBuf },

    /// Restore phrases from a JSON backup
    ImportJson { path: PathBuf },

    /// List supported languages
    Languages,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let conn = init_database(&cli.db)?;
    let app = App::new(conn, cli.now, cli.json);

    match cli.command {
        Command::Add { source, translation, from, to, tags } => {
            app.add(&source, &translation, &from, &to, tags.as_deref())?
        }
        Command::List { tag } => app.list(tag.as_deref())?,
        Command::Show { id } => app.show(id)?,
        Command::Edit { id, translation } => app.edit(id, &translation)?,
        Command::Delete { id } => app.delete(id)?,
        Command::Tags => app.tags()?,
        Command::Tag { id, tags } => app.set_tags(id, &tags)?,
        Command::Untag { id, tag_id } => app.untag(id, tag_id)?,
        Command::Due => app.due()?,
        Command::Rate { id, rating } => app.rate(id, &rating)?,
        Command::Review => app.review()?,
        Command::Stats => app.stats()?,
        Command::ExportAnki { path } => app.export_anki(&path)?,
        Command::ExportJson { path } => app.export_json(&path)?,
        Command::ImportJson { path } => app.import_json(&path)?,
        Command::Languages => app.languages()?,
    }

    Ok(())
}
