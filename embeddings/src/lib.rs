//! # Embeddings
//!
//! Embedding generation and nearest-neighbour lookup over small word corpora.
//!
//! ## Features
//!
//! - **Corpus loading**: one-column CSV word lists become ordered [`Record`]s
//! - **Embedding providers**: an injected [`EmbeddingProvider`] turns text into vectors
//! - **Similarity index**: build once, then answer top-k queries by cosine similarity
//! - **Caching**: repeated texts hit the provider only once per process
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Similarity Lookup                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Corpus ──► EmbeddingProvider ──► SimilarityIndex ──► top-k     │
//! │                  │                       ▲                      │
//! │                  ▼                       │                      │
//! │            CachedProvider ───────────────┘ (query embedding)    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wordsim_embeddings::{Corpus, OpenAIProvider, SimilarityIndex};
//!
//! let corpus = Corpus::from_csv_path("similar_words.csv")?;
//! let provider = OpenAIProvider::new();
//! let index = SimilarityIndex::build(corpus.into_records(), &provider).await?;
//!
//! for hit in index.query(&provider, "fruit", 5).await? {
//!     println!("{} ({:.3})", hit.record.text, hit.score);
//! }
//! ```

pub mod cache;
pub mod corpus;
pub mod error;
pub mod index;
pub mod provider;
pub mod similarity;

pub use cache::{CacheStats, CachedProvider, EmbeddingCache};
pub use corpus::{Corpus, Record};
pub use error::{CorpusError, EmbeddingError, EmbeddingResult, IndexError, Result};
pub use index::SimilarityIndex;
pub use provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, OpenAIProvider};
pub use similarity::{SimilarityResult, cosine_similarity};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of embeddings (varies by model).
pub const DEFAULT_DIMENSION: usize = 1536; // OpenAI text-embedding-3-small

/// Number of matches returned when the caller does not ask for a specific count.
pub const DEFAULT_TOP_K: usize = 5;
