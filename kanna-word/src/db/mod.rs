//! Database access for kanna-word

pub mod words;

pub use words::WordStore;
