//! Word cache queries
//!
//! Parameterized queries against `notebook_words` and `english_dictionary`.
//! No business logic: the lookup service decides what to do with failures.

use chrono::{DateTime, Utc};
use kanna_common::{Result, WordRecord};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const SELECT_WORD_COLUMNS: &str = r#"
    SELECT nw.id, nw.word, nw.translations, nw.created_on, nw.appearance_count,
           nw.last_appeared_on, ee.explanation AS english_explanation
    FROM notebook_words AS nw
    LEFT JOIN english_dictionary AS ee ON ee.word = nw.word
"#;

/// Handle to the word cache, cheap to clone across tasks
#[derive(Clone)]
pub struct WordStore {
    pool: SqlitePool,
}

impl WordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Exact-match lookup joined with the English gloss
    pub async fn find_word(&self, word: &str) -> Result<Option<WordRecord>> {
        let query = format!("{} WHERE nw.word = ?", SELECT_WORD_COLUMNS);
        let row = sqlx::query(&query)
            .bind(word)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    /// English-only gloss for `word`, if the reference table has one
    pub async fn find_english_gloss(&self, word: &str) -> Result<Option<String>> {
        let gloss = sqlx::query_scalar::<_, String>(
            "SELECT explanation FROM english_dictionary WHERE word = ?",
        )
        .bind(word)
        .fetch_optional(&self.pool)
        .await?;

        Ok(gloss)
    }

    /// Insert a freshly fetched record
    ///
    /// Returns the new row id, or `None` when the word is already cached.
    pub async fn insert_word(&self, record: &WordRecord) -> Result<Option<i64>> {
        let result = sqlx::query(
            r#"
            INSERT INTO notebook_words
                (word, translations, created_on, appearance_count, last_appeared_on)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(word) DO NOTHING
            "#,
        )
        .bind(&record.word)
        .bind(&record.translations)
        .bind(record.created_on)
        .bind(record.appearance_count)
        .bind(record.last_appeared_on)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(result.last_insert_rowid()))
    }

    /// Count one more appearance of the word with row id `id`
    ///
    /// Returns `false` if no such row exists.
    pub async fn record_appearance(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE notebook_words
            SET appearance_count = appearance_count + 1,
                last_appeared_on = ?
            WHERE id = ?
            "#,
        )
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Up to `limit` words, most frequently looked-up first
    ///
    /// Ties break on most recent appearance, then insertion order.
    pub async fn list_words(&self, limit: u32) -> Result<Vec<WordRecord>> {
        let query = format!(
            "{} ORDER BY nw.appearance_count DESC, nw.last_appeared_on DESC, nw.id ASC LIMIT ?",
            SELECT_WORD_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(record_from_row).collect()
    }

    pub async fn count_words(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notebook_words")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn record_from_row(row: &SqliteRow) -> Result<WordRecord> {
    Ok(WordRecord {
        id: Some(row.try_get("id")?),
        word: row.try_get("word")?,
        translations: row.try_get("translations")?,
        english_explanation: row.try_get("english_explanation")?,
        created_on: row.try_get("created_on")?,
        appearance_count: row.try_get("appearance_count")?,
        last_appeared_on: row.try_get("last_appeared_on")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> WordStore {
        // One connection: every connection to sqlite::memory: is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        kanna_common::db::create_schema(&pool).await.unwrap();
        WordStore::new(pool)
    }

    async fn insert_gloss(store: &WordStore, word: &str, explanation: &str) {
        sqlx::query("INSERT INTO english_dictionary (word, explanation) VALUES (?, ?)")
            .bind(word)
            .bind(explanation)
            .execute(store.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_find_word_with_gloss() {
        let store = test_store().await;
        insert_gloss(&store, "hello", "used as a greeting").await;

        let now = Utc::now();
        let record = WordRecord::fetched("hello", r#"{"translation":["你好"]}"#, None, now);
        let id = store.insert_word(&record).await.unwrap();
        assert!(id.is_some());

        let found = store.find_word("hello").await.unwrap().expect("word cached");
        assert_eq!(found.id, id);
        assert_eq!(found.translations, record.translations);
        assert_eq!(found.english_explanation.as_deref(), Some("used as a greeting"));
        assert_eq!(found.appearance_count, 1);
        assert_eq!(found.created_on, Some(now));
    }

    #[tokio::test]
    async fn test_find_word_is_case_sensitive() {
        let store = test_store().await;
        let record = WordRecord::fetched("Polish", "{}", None, Utc::now());
        store.insert_word(&record).await.unwrap();

        assert!(store.find_word("Polish").await.unwrap().is_some());
        assert!(store.find_word("polish").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_noop() {
        let store = test_store().await;
        let record = WordRecord::fetched("hello", "{}", None, Utc::now());

        assert!(store.insert_word(&record).await.unwrap().is_some());
        assert_eq!(store.insert_word(&record).await.unwrap(), None);
        assert_eq!(store.count_words().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_record_appearance_increments_count() {
        let store = test_store().await;
        let created = Utc::now() - Duration::days(1);
        let record = WordRecord::fetched("hello", "{}", None, created);
        let id = store.insert_word(&record).await.unwrap().unwrap();

        let seen = Utc::now();
        assert!(store.record_appearance(id, seen).await.unwrap());
        assert!(store.record_appearance(id, seen).await.unwrap());

        let found = store.find_word("hello").await.unwrap().unwrap();
        assert_eq!(found.appearance_count, 3);
        assert_eq!(found.last_appeared_on, Some(seen));
        assert_eq!(found.created_on, Some(created));
    }

    #[tokio::test]
    async fn test_record_appearance_unknown_id() {
        let store = test_store().await;
        assert!(!store.record_appearance(42, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_english_gloss() {
        let store = test_store().await;
        insert_gloss(&store, "hello", "used as a greeting").await;

        assert_eq!(
            store.find_english_gloss("hello").await.unwrap().as_deref(),
            Some("used as a greeting")
        );
        assert_eq!(store.find_english_gloss("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_words_orders_by_frequency() {
        let store = test_store().await;
        let now = Utc::now();

        for (word, count) in [("a", 3), ("b", 1), ("c", 2)] {
            let mut record = WordRecord::fetched(word, "{}", None, now);
            record.appearance_count = count;
            store.insert_word(&record).await.unwrap();
        }

        let listed: Vec<String> = store
            .list_words(2)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.word)
            .collect();
        assert_eq!(listed, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_list_words_ties_break_on_recency() {
        let store = test_store().await;
        let earlier = Utc::now() - Duration::hours(1);
        let later = Utc::now();

        store
            .insert_word(&WordRecord::fetched("old", "{}", None, earlier))
            .await
            .unwrap();
        store
            .insert_word(&WordRecord::fetched("new", "{}", None, later))
            .await
            .unwrap();

        let listed: Vec<String> = store
            .list_words(5)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.word)
            .collect();
        assert_eq!(listed, vec!["new", "old"]);
    }
}
