//! Pronunciation clips
//!
//! Ensures `<speech_dir>/<word>.mp3` exists, downloading it on first use, then
//! hands it to an external player. Everything here is best-effort: failures
//! are logged and never reach the lookup that triggered them.
//!
//! Downloads are written to a private `.part` file and renamed onto the clip
//! path only once complete, so the clip path never holds a truncated clip.

use kanna_common::config::SpeechConfig;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::background::BackgroundTasks;

const CLIP_EXTENSION: &str = "mp3";

/// Bytes escaped in clip file names; `%` itself is escaped, so distinct words
/// never share a file
const CLIP_NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Download failed: {0}")]
    Download(String),

    #[error("Clip server returned HTTP {0}")]
    Status(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Player failed: {0}")]
    Player(String),
}

/// External audio player invocation: `<program> [args...] <clip>`
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PlayerCommand {
    /// `None` when no player is configured for this platform
    pub fn from_config(config: &SpeechConfig) -> Option<Self> {
        config
            .player
            .as_ref()
            .filter(|p| !p.trim().is_empty())
            .map(|program| Self {
                program: program.clone(),
                args: config.player_args.clone(),
            })
    }
}

/// Clip file name for `word`
///
/// ASCII letters, digits, `-` and `_` are kept; every other byte is
/// percent-encoded, which also neutralises path separators.
pub fn clip_file_name(word: &str) -> String {
    format!(
        "{}.{}",
        utf8_percent_encode(word, CLIP_NAME_ENCODE_SET),
        CLIP_EXTENSION
    )
}

/// In-progress download target next to the clip, deleted on drop unless
/// renamed into place. Dropping covers failed and cancelled downloads alike.
struct PartialClip {
    path: PathBuf,
    persisted: bool,
}

impl PartialClip {
    fn new(clip: &Path, seq: u64) -> Self {
        let mut name = clip.as_os_str().to_os_string();
        name.push(format!(".{}-{}.part", std::process::id(), seq));
        Self {
            path: PathBuf::from(name),
            persisted: false,
        }
    }

    async fn persist(mut self, clip: &Path) -> Result<(), SpeechError> {
        tokio::fs::rename(&self.path, clip).await?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for PartialClip {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Downloads and plays pronunciation clips on the background task group
#[derive(Clone)]
pub struct SpeechService {
    http_client: reqwest::Client,
    speech_dir: PathBuf,
    player: Option<PlayerCommand>,
    downloads: Arc<Semaphore>,
    part_seq: Arc<AtomicU64>,
    tasks: BackgroundTasks,
}

impl SpeechService {
    pub fn new(
        http_client: reqwest::Client,
        speech_dir: PathBuf,
        config: &SpeechConfig,
        tasks: BackgroundTasks,
    ) -> Self {
        Self {
            http_client,
            speech_dir,
            player: PlayerCommand::from_config(config),
            downloads: Arc::new(Semaphore::new(config.max_concurrent_downloads.max(1))),
            part_seq: Arc::new(AtomicU64::new(0)),
            tasks,
        }
    }

    pub fn clip_path(&self, word: &str) -> PathBuf {
        self.speech_dir.join(clip_file_name(word))
    }

    /// Fetch (if needed) and play the clip for `word` without waiting
    pub fn play_word(&self, word: &str, url: &str) {
        let service = self.clone();
        let word = word.to_string();
        let url = url.to_string();

        self.tasks.spawn("speech", async move {
            if let Err(e) = service.fetch_and_play(&word, &url).await {
                warn!(word = %word, error = %e, "Pronunciation unavailable");
            }
        });
    }

    /// Ensure the clip is cached locally, then play it
    pub async fn fetch_and_play(&self, word: &str, url: &str) -> Result<PathBuf, SpeechError> {
        let path = self.ensure_clip(word, url).await?;
        self.play(&path).await?;
        Ok(path)
    }

    /// Return the cached clip path, downloading it first if absent
    pub async fn ensure_clip(&self, word: &str, url: &str) -> Result<PathBuf, SpeechError> {
        let path = self.clip_path(word);
        if is_cached(&path).await {
            debug!(word = %word, path = %path.display(), "Using cached clip");
            return Ok(path);
        }

        let _permit = self
            .downloads
            .acquire()
            .await
            .map_err(|e| SpeechError::Download(e.to_string()))?;

        // Another task may have finished the same clip while we waited
        if is_cached(&path).await {
            return Ok(path);
        }

        let part = PartialClip::new(&path, self.part_seq.fetch_add(1, Ordering::Relaxed));
        self.download(url, &part.path).await?;
        part.persist(&path).await?;

        info!(word = %word, path = %path.display(), "Downloaded pronunciation clip");
        Ok(path)
    }

    async fn download(&self, url: &str, path: &Path) -> Result<(), SpeechError> {
        let mut response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| SpeechError::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Status(status.as_u16()));
        }

        let mut file = tokio::fs::File::create(path).await?;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| SpeechError::Download(e.to_string()))?
        {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(())
    }

    /// Play `path` with the configured player and wait for it to exit
    pub async fn play(&self, path: &Path) -> Result<(), SpeechError> {
        let Some(player) = &self.player else {
            debug!(path = %path.display(), "No audio player configured, skipping playback");
            return Ok(());
        };

        let status = tokio::process::Command::new(&player.program)
            .args(&player.args)
            .arg(path)
            .status()
            .await
            .map_err(|e| SpeechError::Player(format!("{}: {}", player.program, e)))?;

        if !status.success() {
            return Err(SpeechError::Player(format!(
                "{} exited with {}",
                player.program, status
            )));
        }

        Ok(())
    }
}

async fn is_cached(path: &Path) -> bool {
    matches!(tokio::fs::metadata(path).await, Ok(meta) if meta.is_file() && meta.len() > 0)
}
