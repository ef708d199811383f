//! Startup and the lookup loop.

use std::io::Write;

use anyhow::{Context, bail};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};
use wordsim_embeddings::{
    CachedProvider, Corpus, EmbeddingCache, EmbeddingProvider, OpenAIProvider, Result,
    SimilarityIndex, SimilarityResult,
};

use crate::config::{EmbeddingConfig, SimilarWordsConfig};
use crate::output::{render_matches, render_preview};

/// A built index together with the provider that built it.
pub struct App {
    index: SimilarityIndex,
    provider: Box<dyn EmbeddingProvider>,
    top_k: usize,
    show_scores: bool,
}

/// Counts from one lookup session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub answered: usize,
    pub failed: usize,
}

/// Create the OpenAI provider described by `config`, wrapped in a cache if enabled.
pub fn provider_from_config(config: &EmbeddingConfig) -> Box<dyn EmbeddingProvider> {
    let mut provider = OpenAIProvider::new()
        .with_base_url(config.base_url.as_str())
        .with_model(config.model.as_str())
        .with_timeout(config.timeout());
    if let Some(dimensions) = config.dimensions {
        provider = provider.with_dimensions(dimensions);
    }

    if config.cache_enabled {
        Box::new(CachedProvider::new(
            provider,
            EmbeddingCache::new(config.cache_max_entries),
        ))
    } else {
        Box::new(provider)
    }
}

impl App {
    /// Load the corpus and build the index. Nothing is answered until this succeeds.
    pub async fn start(
        config: &SimilarWordsConfig,
        provider: Box<dyn EmbeddingProvider>,
        notices: &mut impl Write,
    ) -> anyhow::Result<Self> {
        if !provider.is_available() {
            bail!(
                "the {} embedding provider is not configured; set OPENAI_API_KEY",
                provider.name()
            );
        }

        let corpus = Corpus::from_csv_path(&config.corpus_path).with_context(|| {
            format!("failed to load corpus {}", config.corpus_path.display())
        })?;

        if config.preview_rows > 0 {
            notices.write_all(
                render_preview(corpus.preview(config.preview_rows), corpus.len()).as_bytes(),
            )?;
        }

        let index = SimilarityIndex::build(corpus.into_records(), provider.as_ref())
            .await
            .context("failed to build similarity index")?;

        Ok(Self {
            index,
            provider,
            top_k: config.query.top_k,
            show_scores: config.query.show_scores,
        })
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    /// Look up one word.
    pub async fn lookup(&self, word: &str) -> Result<Vec<SimilarityResult>> {
        self.index
            .query(self.provider.as_ref(), word, self.top_k)
            .await
    }

    /// Answer one word, writing matches to `out` or the error to `err`.
    async fn answer(
        &self,
        word: &str,
        out: &mut impl Write,
        err: &mut impl Write,
        summary: &mut SessionSummary,
    ) -> std::io::Result<()> {
        match self.lookup(word).await {
            Ok(results) => {
                summary.answered += 1;
                out.write_all(render_matches(&results, self.show_scores).as_bytes())?;
                out.flush()
            }
            Err(e) => {
                summary.failed += 1;
                warn!("Lookup for {word:?} failed: {e}");
                writeln!(err, "error: {e}")
            }
        }
    }

    /// Answer every word in `words`.
    pub async fn answer_all(
        &self,
        words: &[String],
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> std::io::Result<SessionSummary> {
        let mut summary = SessionSummary::default();
        for word in words.iter().filter(|w| !w.trim().is_empty()) {
            self.answer(word, out, err, &mut summary).await?;
        }
        Ok(summary)
    }

    /// Answer words read line by line from `input` until EOF. Blank lines are skipped.
    pub async fn answer_lines<R>(
        &self,
        input: R,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> std::io::Result<SessionSummary>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut summary = SessionSummary::default();
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            self.answer(&line, out, err, &mut summary).await?;
        }
        info!(
            "Session finished: {} answered, {} failed",
            summary.answered, summary.failed
        );
        Ok(summary)
    }
}
