//! # Kanna Common Library
//!
//! Shared code for the kanna vocabulary notebook:
//! - Error type shared by the store and configuration layers
//! - Root folder resolution and TOML configuration
//! - Tracing initialisation
//! - Database bootstrap and the word record model

pub mod config;
pub mod db;
pub mod error;
pub mod logging;

pub use db::WordRecord;
pub use error::{Error, Result};
