//! Similarity index over a fixed corpus.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::Embedding;
use crate::corpus::Record;
use crate::error::{EmbeddingError, IndexError, Result};
use crate::provider::{EmbeddingProvider, EmbeddingRequest};
use crate::similarity::{SimilarityResult, dot_product, normalize, rank_top_k};

/// An entry in the similarity index.
#[derive(Debug, Clone)]
struct IndexEntry {
    record: Record,

    /// The embedding vector (normalized).
    embedding: Embedding,
}

/// A read-only nearest-neighbour index over embedded records.
///
/// Built once with [`SimilarityIndex::build`]; afterwards it is never mutated,
/// so an `Arc<SimilarityIndex>` can serve concurrent queries without locking.
/// Ranking is cosine similarity, ties broken by ascending record id.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    /// Entries in load order.
    entries: Vec<IndexEntry>,

    /// Dimension shared by every stored vector.
    dimension: usize,

    /// Model reported by the provider at build time, if any.
    model: Option<String>,
}

impl SimilarityIndex {
    /// Embed every record and build the index.
    ///
    /// All records are embedded before anything is indexed. Any provider
    /// failure aborts the whole build and no index is returned.
    pub async fn build(records: Vec<Record>, provider: &dyn EmbeddingProvider) -> Result<Self> {
        if records.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }

        info!(
            "Embedding {} records with {} ({})",
            records.len(),
            provider.name(),
            provider.default_model()
        );

        let requests = records
            .iter()
            .map(|record| EmbeddingRequest::new(record.text.clone()))
            .collect();
        let responses = provider.embed_batch(requests).await?;

        if responses.len() != records.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                records.len(),
                responses.len()
            ))
            .into());
        }

        let model = responses.first().map(|r| r.model.clone());
        let pairs = records
            .into_iter()
            .zip(responses.into_iter().map(|r| r.embedding))
            .collect();

        let mut index = Self::from_embeddings(pairs)?;
        index.model = model;
        Ok(index)
    }

    /// Build an index from records whose vectors are already known.
    ///
    /// The first vector fixes the index dimension.
    pub fn from_embeddings(pairs: Vec<(Record, Embedding)>) -> Result<Self> {
        let dimension = match pairs.first() {
            Some((_, embedding)) => embedding.len(),
            None => return Err(IndexError::EmptyCorpus),
        };

        let mut seen = HashSet::with_capacity(pairs.len());
        let mut entries = Vec::with_capacity(pairs.len());

        for (record, mut embedding) in pairs {
            if !seen.insert(record.id) {
                return Err(IndexError::DuplicateRecordId(record.id));
            }
            validate_vector(&record.text, &embedding, dimension)?;
            normalize(&mut embedding);
            entries.push(IndexEntry { record, embedding });
        }

        info!(
            "Built similarity index with {} records ({dimension} dimensions)",
            entries.len()
        );

        Ok(Self {
            entries,
            dimension,
            model: None,
        })
    }

    /// Return up to `k` records most similar to `text`, best first.
    ///
    /// `provider` must be the provider (and model) the index was built with.
    pub async fn query(
        &self,
        provider: &dyn EmbeddingProvider,
        text: &str,
        k: usize,
    ) -> Result<Vec<SimilarityResult>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(IndexError::InvalidQuery("query text must not be empty".to_string()));
        }
        if k == 0 {
            return Err(IndexError::InvalidQuery("k must be at least 1".to_string()));
        }

        debug!("Querying similarity index for {text:?} (k = {k})");

        let response = provider.embed(EmbeddingRequest::new(text)).await?;
        if let Some(model) = &self.model
            && *model != response.model
        {
            warn!(
                "Query embedded with model {} but index was built with {model}",
                response.model
            );
        }

        self.search(&response.embedding, k)
    }

    /// Rank stored records against a precomputed query vector.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SimilarityResult>> {
        if k == 0 {
            return Err(IndexError::InvalidQuery("k must be at least 1".to_string()));
        }
        validate_vector("<query>", query, self.dimension)?;

        let mut query = query.to_vec();
        normalize(&mut query);

        let scored = self
            .entries
            .iter()
            .map(|entry| Ok((&entry.record, dot_product(&entry.embedding, &query)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(rank_top_k(scored, k))
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no records. Never true for a built index.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length of every stored vector and of accepted query vectors.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Model the provider reported at build time.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Indexed records in load order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Look up a record by id.
    pub fn get(&self, id: usize) -> Option<&Record> {
        self.records().find(|r| r.id == id)
    }
}

fn validate_vector(text: &str, embedding: &[f32], dimension: usize) -> Result<()> {
    if embedding.len() != dimension {
        return Err(IndexError::DimensionMismatch {
            expected: dimension,
            actual: embedding.len(),
        });
    }
    if dimension == 0 {
        return Err(IndexError::InvalidEmbedding {
            text: text.to_string(),
            reason: "vector is empty".to_string(),
        });
    }
    if embedding.iter().any(|x| !x.is_finite()) {
        return Err(IndexError::InvalidEmbedding {
            text: text.to_string(),
            reason: "vector contains non-finite values".to_string(),
        });
    }
    Ok(())
}
