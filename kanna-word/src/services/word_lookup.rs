//! Word lookup orchestration
//!
//! Cache-aside over the word store:
//! 1. Exact-match read (joined with the English gloss)
//! 2. Hit: count the appearance in the background, return immediately
//! 3. Miss: fetch from the provider; provider failure is the only error
//! 4. Attach the English gloss, backfill the store, return the fetched record
//!
//! The store is a cache, not the source of truth. Store failures are logged
//! and never keep a fetched translation from reaching the caller.

use chrono::Utc;
use kanna_common::WordRecord;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::background::BackgroundTasks;
use super::youdao_client::TranslationProvider;
use crate::db::WordStore;
use crate::Result;

#[derive(Clone)]
pub struct LookupService {
    store: WordStore,
    provider: Arc<dyn TranslationProvider>,
    tasks: BackgroundTasks,
}

impl LookupService {
    pub fn new(
        store: WordStore,
        provider: Arc<dyn TranslationProvider>,
        tasks: BackgroundTasks,
    ) -> Self {
        Self {
            store,
            provider,
            tasks,
        }
    }

    /// Resolve `word` to a record, from the cache or the provider
    pub async fn query_word(&self, word: &str) -> Result<WordRecord> {
        match self.store.find_word(word).await {
            Ok(Some(record)) => return Ok(self.serve_hit(record)),
            Ok(None) => debug!(word = %word, "Cache miss"),
            Err(e) => warn!(word = %word, error = %e, "Cache read failed, asking provider"),
        }

        let translations = self.provider.translate(word).await?;

        let english_explanation = match self.store.find_english_gloss(word).await {
            Ok(gloss) => gloss,
            Err(e) => {
                warn!(word = %word, error = %e, "English gloss lookup failed");
                None
            }
        };

        let mut record = WordRecord::fetched(word, translations, english_explanation, Utc::now());

        match self.store.insert_word(&record).await {
            Ok(Some(id)) => {
                record.id = Some(id);
                info!(word = %word, id, provider = self.provider.name(), "Cached new word");
            }
            Ok(None) => debug!(word = %word, "Word cached concurrently, keeping existing row"),
            Err(e) => error!(word = %word, error = %e, "Failed to cache word"),
        }

        Ok(record)
    }

    /// Up to `count` cached words, most frequently looked-up first
    pub async fn list_words(&self, count: u32) -> Result<Vec<WordRecord>> {
        Ok(self.store.list_words(count).await?)
    }

    /// Count the hit in the background; the returned record already reflects it
    fn serve_hit(&self, mut record: WordRecord) -> WordRecord {
        let now = Utc::now();

        if let Some(id) = record.id {
            let store = self.store.clone();
            let word = record.word.clone();
            self.tasks.spawn("appearance-update", async move {
                match store.record_appearance(id, now).await {
                    Ok(true) => debug!(word = %word, id, "Appearance counted"),
                    Ok(false) => warn!(word = %word, id, "Cached word vanished before its count update"),
                    Err(e) => error!(word = %word, id, error = %e, "Failed to count appearance"),
                }
            });
        }

        record.appearance_count += 1;
        record.last_appeared_on = Some(now);
        debug!(word = %record.word, count = record.appearance_count, "Cache hit");
        record
    }
}
