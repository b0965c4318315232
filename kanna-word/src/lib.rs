//! kanna-word: vocabulary lookup with a local word cache
//!
//! Looks words up in the SQLite cache, falls back to the Youdao dictionary
//! API on a miss, backfills the cache and plays a pronunciation clip when the
//! provider offers one.
//!
//! Data flow: producer → [`dispatcher::CommandDispatcher`] →
//! [`services::LookupService`] → {[`db::WordStore`] | provider} →
//! [`formatter::Formatter`] → output sink. Clip download/playback and
//! counter updates run detached on [`services::BackgroundTasks`].

pub mod db;
pub mod dispatcher;
pub mod error;
pub mod formatter;
pub mod services;

pub use crate::error::{Error, Result};

use anyhow::Context;
use kanna_common::config::{resolve_youdao_key, RootFolderInitializer, TomlConfig};
use std::sync::Arc;
use tracing::info;

use crate::db::WordStore;
use crate::formatter::Formatter;
use crate::services::youdao_client::build_http_client;
use crate::services::{
    BackgroundTasks, LookupService, SpeechService, TranslationProvider, YoudaoClient,
};

/// Everything the lookup path needs, built once at startup
#[derive(Clone)]
pub struct AppContext {
    pub store: WordStore,
    pub provider: Arc<dyn TranslationProvider>,
    /// `None` when speech is disabled in config
    pub speech: Option<SpeechService>,
    pub tasks: BackgroundTasks,
}

impl AppContext {
    /// Assemble a context from already-built parts
    pub fn new(
        store: WordStore,
        provider: Arc<dyn TranslationProvider>,
        speech: Option<SpeechService>,
        tasks: BackgroundTasks,
    ) -> Self {
        Self {
            store,
            provider,
            speech,
            tasks,
        }
    }

    /// Open the database and build the HTTP-backed services from config
    pub async fn initialize(root: &RootFolderInitializer, config: &TomlConfig) -> anyhow::Result<Self> {
        let db_path = root.database_path(&config.database);
        let pool = kanna_common::db::init_database(&db_path, &config.database)
            .await
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        let store = WordStore::new(pool);

        let key = resolve_youdao_key(&config.youdao)?;
        let http_client = build_http_client(&config.youdao)?;
        let provider: Arc<dyn TranslationProvider> =
            Arc::new(YoudaoClient::new(http_client.clone(), &config.youdao, key));

        let tasks = BackgroundTasks::new();

        let speech = if config.speech.enabled {
            Some(SpeechService::new(
                http_client,
                root.speech_dir(),
                &config.speech,
                tasks.clone(),
            ))
        } else {
            info!("Pronunciation clips disabled");
            None
        };

        Ok(Self::new(store, provider, speech, tasks))
    }

    pub fn lookup_service(&self) -> LookupService {
        LookupService::new(self.store.clone(), Arc::clone(&self.provider), self.tasks.clone())
    }

    pub fn formatter(&self) -> Formatter {
        Formatter::new(self.speech.clone())
    }
}
