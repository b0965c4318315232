//! Test Helper Utilities
//!
//! Shared utilities for testing kanna-word
#![allow(dead_code)]

pub mod db_utils;
pub mod fake_provider;
pub mod http_stub;

// Re-export commonly used items
pub use db_utils::{create_test_store, insert_gloss, seed_word};
pub use fake_provider::{payload, FakeProvider};
pub use http_stub::{spawn_http_stub, spawn_stalling_clip_server};
