//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ConfigError, SimilarWordsConfig};

/// Find the words in a word list that are closest in meaning to a query word.
///
/// Words given as arguments are looked up in turn; without any, words are
/// read from stdin one per line.
#[derive(Debug, Parser)]
#[command(name = "similar-words", version, about, long_about = None)]
pub struct Cli {
    /// Words to look up.
    pub words: Vec<String>,

    /// One-column CSV word list.
    #[arg(long, env = "WORDSIM_CORPUS")]
    pub corpus: Option<PathBuf>,

    /// Number of matches to show per word.
    #[arg(short = 'k', long, env = "WORDSIM_TOP_K")]
    pub top_k: Option<usize>,

    /// Embedding model.
    #[arg(long, env = "WORDSIM_EMBEDDING_MODEL")]
    pub model: Option<String>,

    /// Shortened embedding dimension (text-embedding-3 models).
    #[arg(long, env = "WORDSIM_EMBEDDING_DIMENSIONS")]
    pub dimensions: Option<usize>,

    /// Embeddings API base URL.
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "WORDSIM_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Do not cache query embeddings.
    #[arg(long)]
    pub no_cache: bool,

    /// Maximum number of cached embeddings.
    #[arg(long)]
    pub cache_size: Option<usize>,

    /// Corpus rows to show at startup (0 to hide).
    #[arg(long)]
    pub preview: Option<usize>,

    /// Print similarity scores next to each match.
    #[arg(long)]
    pub scores: bool,

    /// TOML file with default settings; flags and environment win over it.
    #[arg(long, env = "WORDSIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the effective configuration: defaults, then file, then flags.
    pub fn resolve_config(&self) -> Result<SimilarWordsConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => SimilarWordsConfig::from_toml_file(path)?,
            None => SimilarWordsConfig::default(),
        };

        if let Some(corpus) = &self.corpus {
            config.corpus_path = corpus.clone();
        }
        if let Some(top_k) = self.top_k {
            config.query.top_k = top_k;
        }
        if let Some(model) = &self.model {
            config.embedding.model = model.clone();
        }
        if let Some(dimensions) = self.dimensions {
            config.embedding.dimensions = Some(dimensions);
        }
        if let Some(base_url) = &self.base_url {
            config.embedding.base_url = base_url.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.embedding.timeout_secs = timeout_secs;
        }
        if self.no_cache {
            config.embedding.cache_enabled = false;
        }
        if let Some(cache_size) = self.cache_size {
            config.embedding.cache_max_entries = cache_size;
        }
        if let Some(preview) = self.preview {
            config.preview_rows = preview;
        }
        if self.scores {
            config.query.show_scores = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("similar-words").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["apple"]);
        let config = cli.resolve_config().unwrap();

        assert_eq!(cli.words, vec!["apple".to_string()]);
        assert_eq!(config.query.top_k, 5);
        assert!(config.embedding.cache_enabled);
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "corpus_path = \"from-file.csv\"\n\
             [query]\ntop_k = 2\n\
             [embedding]\nmodel = \"file-model\""
        )
        .unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let cli = parse(&["--config", &path, "-k", "4", "--no-cache", "--scores"]);
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.corpus_path, PathBuf::from("from-file.csv"));
        assert_eq!(config.query.top_k, 4);
        assert_eq!(config.embedding.model, "file-model");
        assert!(!config.embedding.cache_enabled);
        assert!(config.query.show_scores);
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let cli = parse(&["-k", "0"]);
        assert!(matches!(
            cli.resolve_config(),
            Err(ConfigError::Invalid { name: "top_k", .. })
        ));
    }
}
