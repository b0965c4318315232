//! In-memory translation provider with call accounting

use async_trait::async_trait;
use kanna_word::services::{ProviderError, TranslationProvider};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Answers from a fixed table; unknown words fail with HTTP 500
#[derive(Default)]
pub struct FakeProvider {
    payloads: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_word(mut self, word: &str, payload: String) -> Self {
        self.payloads.insert(word.to_string(), payload);
        self
    }

    /// Delay the answer for `word`
    pub fn with_delay(mut self, word: &str, delay: Duration) -> Self {
        self.delays.insert(word.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslationProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn translate(&self, word: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(word.to_string());

        if let Some(delay) = self.delays.get(word) {
            tokio::time::sleep(*delay).await;
        }

        self.payloads
            .get(word)
            .cloned()
            .ok_or(ProviderError::Status(500))
    }
}

/// Youdao-shaped payload with one translation and one explanation
pub fn payload(translation: &str) -> String {
    serde_json::json!({
        "translation": [translation],
        "basic": {
            "us-phonetic": "ˈtɛst",
            "explains": [format!("n. {}", translation)]
        },
        "errorCode": 0
    })
    .to_string()
}
