//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cached word
///
/// `translations` holds the provider's response body verbatim; the store never
/// parses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    /// Row id, assigned on insertion
    pub id: Option<i64>,
    pub word: String,
    pub translations: String,
    /// Monolingual gloss joined from `english_dictionary`
    pub english_explanation: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub appearance_count: i64,
    pub last_appeared_on: Option<DateTime<Utc>>,
}

impl WordRecord {
    /// Record for a word just fetched from the provider, not yet persisted
    pub fn fetched(
        word: impl Into<String>,
        translations: impl Into<String>,
        english_explanation: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            word: word.into(),
            translations: translations.into(),
            english_explanation,
            created_on: Some(now),
            appearance_count: 1,
            last_appeared_on: Some(now),
        }
    }

    /// Gloss text, treating an empty explanation as absent
    pub fn gloss(&self) -> Option<&str> {
        self.english_explanation
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
    }
}
