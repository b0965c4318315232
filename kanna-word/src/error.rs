//! Error types for kanna-word
//!
//! Only provider failures reach the command layer on the lookup path.
//! Persistence failures surface from the list query; on the lookup path they
//! are logged and swallowed. Payload and speech failures have their own types
//! (`PayloadError`, `SpeechError`) and never leave their modules.

use thiserror::Error;

use crate::services::youdao_client::ProviderError;

#[derive(Debug, Error)]
pub enum Error {
    /// Translation fetch failed; the lookup yields no record
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Store read or write failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] kanna_common::Error),
}

/// Result type for kanna-word operations
pub type Result<T> = std::result::Result<T, Error>;
