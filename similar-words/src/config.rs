//! Configuration for the similar-words tool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wordsim_embeddings::DEFAULT_TOP_K;
use wordsim_embeddings::provider::{OPENAI_BASE_URL, OPENAI_DEFAULT_MODEL};

/// Errors from reading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this tool.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A setting is out of range.
    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarWordsConfig {
    /// One-column CSV word list.
    pub corpus_path: PathBuf,

    /// Corpus rows echoed at startup.
    pub preview_rows: usize,

    /// Embedding provider configuration.
    pub embedding: EmbeddingConfig,

    /// Query configuration.
    pub query: QueryConfig,
}

impl Default for SimilarWordsConfig {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from("similar_words.csv"),
            preview_rows: 3,
            embedding: EmbeddingConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

impl SimilarWordsConfig {
    /// Read a TOML config file. Missing keys keep their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject settings the index or provider would fail on later.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query.top_k == 0 {
            return Err(ConfigError::Invalid {
                name: "top_k",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.embedding.dimensions == Some(0) {
            return Err(ConfigError::Invalid {
                name: "dimensions",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.embedding.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.embedding.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "model",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration for the embedding provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model to use for embeddings.
    pub model: String,

    /// API base URL.
    pub base_url: String,

    /// Shortened output dimension, if the model supports it.
    pub dimensions: Option<usize>,

    /// Per-request timeout.
    pub timeout_secs: u64,

    /// Whether to cache embeddings for repeated queries.
    pub cache_enabled: bool,

    /// Maximum cache size.
    pub cache_max_entries: usize,
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: OPENAI_DEFAULT_MODEL.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            dimensions: None,
            timeout_secs: 30,
            cache_enabled: true,
            cache_max_entries: 1000,
        }
    }
}

/// Configuration for query processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Maximum number of matches to show.
    pub top_k: usize,

    /// Print similarity scores next to each match.
    pub show_scores: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            show_scores: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "corpus_path = \"words.csv\"\n\n[query]\ntop_k = 3\n\n[embedding]\ndimensions = 256"
        )
        .unwrap();

        let config = SimilarWordsConfig::from_toml_file(file.path()).unwrap();

        assert_eq!(config.corpus_path, PathBuf::from("words.csv"));
        assert_eq!(config.query.top_k, 3);
        assert_eq!(config.embedding.dimensions, Some(256));
        assert_eq!(config.embedding.model, OPENAI_DEFAULT_MODEL);
        assert_eq!(config.preview_rows, 3);
    }

    #[test]
    fn test_unreadable_and_malformed_files() {
        assert!(matches!(
            SimilarWordsConfig::from_toml_file("/no/such/config.toml"),
            Err(ConfigError::Read { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[query]\ntop_k = \"five\"").unwrap();
        assert!(matches!(
            SimilarWordsConfig::from_toml_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_validate() {
        assert!(SimilarWordsConfig::default().validate().is_ok());

        let mut config = SimilarWordsConfig::default();
        config.query.top_k = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { name: "top_k", .. })
        ));

        let mut config = SimilarWordsConfig::default();
        config.embedding.dimensions = Some(0);
        assert!(config.validate().is_err());
    }
}
