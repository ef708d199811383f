//! # Similar words
//!
//! Loads a word list, embeds it once, and prints the closest words for each
//! query word.
//!
//! ```text
//! $ similar-words --corpus similar_words.csv -k 3 fruit
//! Top 3 Matches:
//! 1st Match: apple
//! 2nd Match: banana
//! 3rd Match: orange
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod output;

pub use app::{App, SessionSummary, provider_from_config};
pub use cli::Cli;
pub use config::{ConfigError, EmbeddingConfig, QueryConfig, SimilarWordsConfig};
