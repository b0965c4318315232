//! Configuration loading and root folder resolution
//!
//! Root folder priority:
//! 1. Command-line argument (highest priority)
//! 2. `KANNA_ROOT_FOLDER` environment variable
//! 3. OS-dependent default (`<Documents>/Kanna`)
//!
//! Everything else lives in `<root>/config.toml`. Every section is optional;
//! missing keys fall back to compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "KANNA_ROOT_FOLDER";

/// Environment variable overriding `[youdao] key`
pub const YOUDAO_KEY_ENV: &str = "KANNA_YOUDAO_KEY";

const CONFIG_FILE_NAME: &str = "config.toml";
const SPEECH_DIR_NAME: &str = "speech";

/// Root folder resolution
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>) -> Self {
        Self { cli_arg }
    }

    /// Resolve the root folder. Never fails; falls back to the compiled default.
    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        // Priority 3: OS-dependent default
        default_root_folder()
    }
}

/// OS-dependent default root folder (`~/Documents/Kanna` on every platform)
pub fn default_root_folder() -> PathBuf {
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .map(|dir| dir.join("Kanna"))
        .unwrap_or_else(|| PathBuf::from("./kanna_data"))
}

/// Creates the root folder layout and hands out the paths inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the root folder and the speech cache directory if missing
    ///
    /// Returns the directories that had to be created. Runs before tracing is
    /// installed, so reporting them is left to the caller.
    pub fn ensure_directories(&self) -> Result<Vec<PathBuf>> {
        let mut created = Vec::new();
        for dir in [self.root_folder.clone(), self.speech_dir()] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
                created.push(dir);
            }
        }
        Ok(created)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root_folder.join(CONFIG_FILE_NAME)
    }

    /// Directory holding one pronunciation clip per word
    pub fn speech_dir(&self) -> PathBuf {
        self.root_folder.join(SPEECH_DIR_NAME)
    }

    pub fn database_path(&self, config: &DatabaseConfig) -> PathBuf {
        self.root_folder.join(&config.file)
    }

    /// Log file path, or `None` when logging goes to stderr
    pub fn log_path(&self, config: &LoggingConfig) -> Option<PathBuf> {
        if config.file.trim().is_empty() {
            None
        } else {
            Some(self.root_folder.join(&config.file))
        }
    }
}

/// Contents of `<root>/config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Seconds background work (audio, counter updates) gets to finish on exit
    pub shutdown_grace_secs: u64,
    pub youdao: YoudaoConfig,
    pub database: DatabaseConfig,
    pub speech: SpeechConfig,
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: 10,
            youdao: YoudaoConfig::default(),
            database: DatabaseConfig::default(),
            speech: SpeechConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Reject values that would leave a subsystem unusable
    pub fn validate(&self) -> Result<()> {
        if self.youdao.timeout_secs == 0 {
            return Err(Error::Config("youdao.timeout_secs must be at least 1".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(Error::Config("database.max_connections must be at least 1".to_string()));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(Error::Config(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }
        if self.speech.max_concurrent_downloads == 0 {
            return Err(Error::Config(
                "speech.max_concurrent_downloads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Youdao dictionary API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YoudaoConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub keyfrom: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_idle_per_host: usize,
}

impl Default for YoudaoConfig {
    fn default() -> Self {
        Self {
            key: None,
            keyfrom: "YouDaoCV".to_string(),
            base_url: "http://fanyi.youdao.com/openapi.do".to_string(),
            timeout_secs: 10,
            max_idle_per_host: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file, relative to the root folder
    pub file: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file: "kanna.db".to_string(),
            max_connections: 10,
            min_connections: 5,
        }
    }
}

/// Pronunciation clip settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    /// External player invoked as `<player> [player_args...] <clip>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    pub player_args: Vec<String>,
    pub max_concurrent_downloads: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            player: default_player(),
            player_args: Vec::new(),
            max_concurrent_downloads: 4,
        }
    }
}

fn default_player() -> Option<String> {
    if cfg!(target_os = "macos") {
        Some("afplay".to_string())
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Log file relative to the root folder; empty logs to stderr
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: "kanna.log".to_string(),
        }
    }
}

/// Load `config.toml`. A missing file yields defaults; a malformed one is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!("Config file not found, using defaults: {}", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Outcome of [`load_or_create_config`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    /// A default file was written because none existed
    pub created: bool,
}

/// Load `config.toml`, writing a default file first if none exists
pub fn load_or_create_config(path: &Path) -> Result<LoadedConfig> {
    if path.exists() {
        return Ok(LoadedConfig {
            config: load_toml_config(path)?,
            created: false,
        });
    }

    let config = TomlConfig::default();
    write_toml_config(&config, path)?;
    Ok(LoadedConfig {
        config,
        created: true,
    })
}

/// Write config via a temporary file and rename
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}

/// Resolve the provider key
///
/// **Priority:** ENV → TOML
pub fn resolve_youdao_key(config: &YoudaoConfig) -> Result<String> {
    let env_key = std::env::var(YOUDAO_KEY_ENV).ok().filter(|k| is_valid_key(k));
    let toml_key = config.key.clone().filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Youdao key found in both {} and config.toml. Using the environment variable.",
            YOUDAO_KEY_ENV
        );
    }

    if let Some(key) = env_key {
        info!("Youdao key loaded from environment variable");
        return Ok(key);
    }

    if let Some(key) = toml_key {
        info!("Youdao key loaded from config.toml");
        return Ok(key);
    }

    Err(Error::Config(format!(
        "Youdao key not configured. Set one of:\n\
         1. Environment: {}=your-key\n\
         2. config.toml: [youdao] key = \"your-key\"",
        YOUDAO_KEY_ENV
    )))
}

/// Validate key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
