//! Database initialization
//!
//! Opens (or creates) the SQLite word cache and creates its tables.
//! All statements are idempotent, so this runs on every startup.

use crate::config::DatabaseConfig;
use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open the database file, apply connection pragmas and create the schema
pub async fn init_database(db_path: &Path, config: &DatabaseConfig) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets the detached counter updates run alongside lookups
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table used by kanna
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_notebook_words_table(pool).await?;
    create_english_dictionary_table(pool).await?;
    Ok(())
}

/// Word cache, one row per looked-up word
///
/// `word` is UNIQUE so two racing misses for the same new word cannot both
/// insert; the loser's insert becomes a no-op.
pub async fn create_notebook_words_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notebook_words (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            word TEXT NOT NULL UNIQUE,
            translations TEXT NOT NULL,
            created_on TEXT,
            appearance_count INTEGER NOT NULL DEFAULT 1 CHECK (appearance_count >= 1),
            last_appeared_on TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_notebook_words_frequency
         ON notebook_words (appearance_count DESC, last_appeared_on DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Reference table of English-English glosses, maintained outside kanna
pub async fn create_english_dictionary_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS english_dictionary (
            word TEXT PRIMARY KEY,
            explanation TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn table_names(pool: &SqlitePool) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_init_database_creates_file_and_tables() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("kanna.db");

        let pool = init_database(&db_path, &DatabaseConfig::default())
            .await
            .expect("init should succeed");

        assert!(db_path.exists());
        let tables = table_names(&pool).await;
        assert!(tables.contains(&"notebook_words".to_string()));
        assert!(tables.contains(&"english_dictionary".to_string()));
    }

    #[tokio::test]
    async fn test_create_schema_is_idempotent() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        create_schema(&pool).await.unwrap();
        create_schema(&pool).await.unwrap();

        let tables = table_names(&pool).await;
        assert_eq!(tables.iter().filter(|t| t.as_str() == "notebook_words").count(), 1);
        assert_eq!(tables.iter().filter(|t| t.as_str() == "english_dictionary").count(), 1);
    }

    #[tokio::test]
    async fn test_word_column_is_unique() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();

        let insert = "INSERT INTO notebook_words (word, translations) VALUES ('hello', '{}')";
        sqlx::query(insert).execute(&pool).await.unwrap();
        let duplicate = sqlx::query(insert).execute(&pool).await;

        assert!(duplicate.is_err(), "second insert of the same word must fail");
    }
}
