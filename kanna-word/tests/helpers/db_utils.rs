//! Database Test Utilities

use chrono::{DateTime, Utc};
use kanna_common::config::DatabaseConfig;
use kanna_common::WordRecord;
use kanna_word::db::WordStore;
use tempfile::TempDir;

/// Create an on-disk test database with the kanna schema
///
/// Returns (TempDir, WordStore) - TempDir must be kept alive for duration of test
pub async fn create_test_store() -> (TempDir, WordStore) {
    let temp_dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        file: "test_kanna.db".to_string(),
        max_connections: 5,
        min_connections: 1,
    };
    let db_path = temp_dir.path().join(&config.file);

    let pool = kanna_common::db::init_database(&db_path, &config)
        .await
        .expect("Failed to create test database");

    (temp_dir, WordStore::new(pool))
}

/// Add an English-English gloss to the reference table
pub async fn insert_gloss(store: &WordStore, word: &str, explanation: &str) {
    sqlx::query("INSERT INTO english_dictionary (word, explanation) VALUES (?, ?)")
        .bind(word)
        .bind(explanation)
        .execute(store.pool())
        .await
        .unwrap();
}

/// Cache `word` directly with the given appearance count
pub async fn seed_word(
    store: &WordStore,
    word: &str,
    translations: &str,
    appearance_count: i64,
    seen: DateTime<Utc>,
) -> i64 {
    let mut record = WordRecord::fetched(word, translations, None, seen);
    record.appearance_count = appearance_count;
    store
        .insert_word(&record)
        .await
        .unwrap()
        .expect("seeded word should be new")
}
