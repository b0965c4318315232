//! Rendering of word records
//!
//! The cached payload is whatever the provider returned. It is decoded here,
//! at render time, as a loose JSON object: every field is optional and a
//! field with an unexpected shape is treated as absent.

use kanna_common::WordRecord;
use serde_json::{Map, Value};
use std::io::Write;
use thiserror::Error;
use tracing::warn;

use crate::services::speech::SpeechService;

const LIST_SEPARATOR: &str = "--------------------------------------";
const MALFORMED_NOTE: &str = "(translation payload could not be read)";

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not a JSON object: {0}")]
    Malformed(String),
}

/// Provider payload decoded as a loosely-typed object
#[derive(Debug, Clone)]
pub struct TranslationPayload {
    fields: Map<String, Value>,
}

impl TranslationPayload {
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(other) => Err(PayloadError::Malformed(format!(
                "expected an object, found {}",
                json_kind(&other)
            ))),
            Err(e) => Err(PayloadError::Malformed(e.to_string())),
        }
    }

    /// Primary translations
    pub fn translation(&self) -> Option<Vec<&str>> {
        self.fields.get("translation").and_then(string_list)
    }

    pub fn us_phonetic(&self) -> Option<&str> {
        self.basic_str("us-phonetic")
    }

    pub fn uk_phonetic(&self) -> Option<&str> {
        self.basic_str("uk-phonetic")
    }

    /// Secondary explanations
    pub fn explains(&self) -> Option<Vec<&str>> {
        self.basic().and_then(|b| b.get("explains")).and_then(string_list)
    }

    /// Pronunciation clip URL
    pub fn speech_url(&self) -> Option<&str> {
        self.basic_str("us-speech")
    }

    fn basic(&self) -> Option<&Map<String, Value>> {
        self.fields.get("basic").and_then(Value::as_object)
    }

    fn basic_str(&self, key: &str) -> Option<&str> {
        self.basic()
            .and_then(|b| b.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Accepts an array of strings or a lone string
fn string_list(value: &Value) -> Option<Vec<&str>> {
    let items: Vec<&str> = match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => return None,
    };
    let items: Vec<&str> = items.into_iter().filter(|s| !s.is_empty()).collect();
    (!items.is_empty()).then_some(items)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Renders records to an output sink
///
/// Rendering a record with a pronunciation URL also starts a detached clip
/// fetch/playback when a speech service is attached.
#[derive(Clone, Default)]
pub struct Formatter {
    speech: Option<SpeechService>,
}

impl Formatter {
    pub fn new(speech: Option<SpeechService>) -> Self {
        Self { speech }
    }

    /// Render one lookup result
    pub fn render_word(&self, record: &WordRecord, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "---- {} ----", record.word)?;

        let payload = match TranslationPayload::parse(&record.translations) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(word = %record.word, error = %e, "Rendering without translation fields");
                writeln!(out, "{}", MALFORMED_NOTE)?;
                return Ok(());
            }
        };

        if let Some(translation) = payload.translation() {
            writeln!(out, "Translation: {}", translation.join("; "))?;
        }
        if let Some(gloss) = record.gloss() {
            writeln!(out, "English: {}", gloss)?;
        }
        if let Some(phonetic) = payload.us_phonetic() {
            writeln!(out, "US phonetic: {}", phonetic)?;
        }
        if let Some(phonetic) = payload.uk_phonetic() {
            writeln!(out, "UK phonetic: {}", phonetic)?;
        }
        if let Some(explains) = payload.explains() {
            writeln!(out, "Explains: {}", explains.join("; "))?;
        }

        if let (Some(url), Some(speech)) = (payload.speech_url(), &self.speech) {
            speech.play_word(&record.word, url);
        }

        Ok(())
    }

    /// Render a word list, numbered from 1 in the given order
    pub fn render_list(&self, records: &[WordRecord], out: &mut dyn Write) -> std::io::Result<()> {
        for (index, record) in records.iter().enumerate() {
            writeln!(out, "{}. ---- {} ----", index + 1, record.word)?;

            match TranslationPayload::parse(&record.translations) {
                Ok(payload) => {
                    if let Some(translation) = payload.translation() {
                        writeln!(out, "Translation: {}", translation.join("; "))?;
                    }
                    if let Some(gloss) = record.gloss() {
                        writeln!(out, "English: {}", gloss)?;
                    }
                    if let Some(explains) = payload.explains() {
                        writeln!(out, "Explains: {}", explains.join("; "))?;
                    }
                }
                Err(e) => {
                    warn!(word = %record.word, error = %e, "Rendering list entry without translation fields");
                    writeln!(out, "{}", MALFORMED_NOTE)?;
                }
            }

            writeln!(out, "{}", LIST_SEPARATOR)?;
        }
        Ok(())
    }
}
