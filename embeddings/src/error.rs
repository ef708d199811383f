//! Error types for the embeddings system.

use thiserror::Error;

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Result type alias for provider operations.
pub type EmbeddingResult<T> = std::result::Result<T, EmbeddingError>;

/// Errors raised by an embedding provider.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Provider not configured.
    #[error("embedding provider not configured (is OPENAI_API_KEY set?)")]
    ProviderNotConfigured,

    /// API request failed.
    #[error("API request failed with status {status}: {message}")]
    ApiRequest { status: u16, message: String },

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors raised while building or querying a [`crate::SimilarityIndex`].
///
/// A failed build never yields an index, and a failed query never yields a
/// partial result set. Query failures leave the index usable.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Build was called without any records.
    #[error("cannot build a similarity index from an empty corpus")]
    EmptyCorpus,

    /// The embedding provider failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// A vector's length differs from the index dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Two records share the same id.
    #[error("duplicate record id {0}")]
    DuplicateRecordId(usize),

    /// The provider produced a vector that cannot be indexed.
    #[error("invalid embedding for {text:?}: {reason}")]
    InvalidEmbedding { text: String, reason: String },

    /// Query arguments were rejected before reaching the provider.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Errors raised while loading a corpus file.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Input the CSV reader rejects.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A row the CSV reader accepted but that cannot be a corpus entry,
    /// such as a value spanning lines after an unbalanced quote.
    #[error("malformed corpus row {row}: {reason}")]
    Malformed { row: usize, reason: String },
}
