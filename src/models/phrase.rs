//! Phrase is a saved translation: <source phrase, translation> in a language pair
use super::SchedulingState;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phrase {
    pub id: i64,
    pub source_phrase: String,
    pub translation: String,
    pub source_language: String,
    pub target_language: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Phrase {
    /// Language pair label, e.g. "en-es". Also used as the phrase's automatic tag.
    pub fn language_pair(&self) -> String {
        language_pair(&self.source_language, &self.target_language)
    }
}

pub fn language_pair(source_language: &str, target_language: &str) -> String {
    format!("{}-{}", source_language, target_language)
}

/// Input for saving a new phrase.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPhrase {
    pub source_phrase: String,
    pub translation: String,
    pub source_language: String,
    pub target_language: String,
}

/// A phrase together with its tags and scheduling state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseDetails {
    #[serde(flatten)]
    pub phrase: Phrase,
    pub language_pair: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub srs: Option<SchedulingState>,
}
