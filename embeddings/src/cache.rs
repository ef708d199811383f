//! In-process embedding cache.
//!
//! Lives only as long as the process; nothing is written to disk.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, EmbeddingResult};
use crate::provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};

/// Cache entry for an embedding.
#[derive(Debug, Clone)]
struct CacheEntry {
    embedding: Embedding,

    /// Model used to generate the embedding.
    model: String,

    /// Insertion sequence number, used for eviction.
    inserted: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    next_seq: u64,
    hits: u64,
    misses: u64,
}

/// Bounded cache for embeddings to avoid redundant API calls.
///
/// When full, the oldest inserted entry is evicted.
#[derive(Clone)]
pub struct EmbeddingCache {
    state: Arc<RwLock<CacheState>>,

    /// Maximum cache size.
    max_entries: usize,
}

impl EmbeddingCache {
    /// Create a new in-memory cache.
    pub fn new(max_entries: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(CacheState::default())),
            max_entries,
        }
    }

    /// Compute the lookup key for a text under a model configuration.
    fn hash_key(text: &str, model: &str, dimensions: Option<usize>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update([0u8]);
        if let Some(dims) = dimensions {
            hasher.update(dims.to_le_bytes());
        }
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Get an embedding from the cache.
    pub async fn get(
        &self,
        text: &str,
        model: &str,
        dimensions: Option<usize>,
    ) -> Option<Embedding> {
        let key = Self::hash_key(text, model, dimensions);
        let mut state = self.state.write().await;
        let found = state.entries.get(&key).map(|e| e.embedding.clone());
        if found.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        found
    }

    /// Put an embedding in the cache.
    pub async fn put(
        &self,
        text: &str,
        model: &str,
        dimensions: Option<usize>,
        embedding: Embedding,
    ) {
        if self.max_entries == 0 {
            return;
        }

        let key = Self::hash_key(text, model, dimensions);
        let mut state = self.state.write().await;

        if !state.entries.contains_key(&key) && state.entries.len() >= self.max_entries {
            if let Some(oldest_key) = state
                .entries
                .iter()
                .min_by_key(|(_, v)| v.inserted)
                .map(|(k, _)| k.clone())
            {
                state.entries.remove(&oldest_key);
            }
        }

        let inserted = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key,
            CacheEntry {
                embedding,
                model: model.to_string(),
                inserted,
            },
        );
        debug!("Cached embedding for text (model: {model})");
    }

    /// Check if an embedding is cached.
    pub async fn contains(&self, text: &str, model: &str, dimensions: Option<usize>) -> bool {
        let key = Self::hash_key(text, model, dimensions);
        self.state.read().await.entries.contains_key(&key)
    }

    /// Clear the entire cache.
    pub async fn clear(&self) {
        self.state.write().await.entries.clear();
        info!("Cleared embedding cache");
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let state = self.state.read().await;
        let mut models: Vec<String> = state
            .entries
            .values()
            .map(|e| e.model.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        models.sort();

        CacheStats {
            entries: state.entries.len(),
            max_entries: self.max_entries,
            hits: state.hits,
            misses: state.misses,
            models,
        }
    }
}

/// Statistics about the embedding cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of entries in cache.
    pub entries: usize,

    /// Maximum cache size.
    pub max_entries: usize,

    /// Lookups answered from the cache.
    pub hits: u64,

    /// Lookups that had to go to the provider.
    pub misses: u64,

    /// Models with cached embeddings.
    pub models: Vec<String>,
}

/// A provider wrapper that answers repeated texts from an [`EmbeddingCache`].
pub struct CachedProvider<P> {
    provider: P,
    cache: EmbeddingCache,
}

impl<P: EmbeddingProvider> CachedProvider<P> {
    /// Create a new cached provider.
    pub fn new(provider: P, cache: EmbeddingCache) -> Self {
        Self { provider, cache }
    }

    /// Get the underlying cache.
    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    /// Get the wrapped provider.
    pub fn inner(&self) -> &P {
        &self.provider
    }

    fn model_for(&self, request: &EmbeddingRequest) -> String {
        request
            .model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn default_model(&self) -> &str {
        self.provider.default_model()
    }

    fn default_dimension(&self) -> usize {
        self.provider.default_dimension()
    }

    async fn embed(&self, request: EmbeddingRequest) -> EmbeddingResult<EmbeddingResponse> {
        let model = self.model_for(&request);

        if let Some(embedding) = self.cache.get(&request.text, &model, request.dimensions).await {
            debug!("Cache hit for embedding");
            return Ok(EmbeddingResponse {
                dimension: embedding.len(),
                embedding,
                model,
                tokens_used: None,
            });
        }

        let response = self.provider.embed(request.clone()).await?;
        self.cache
            .put(
                &request.text,
                &model,
                request.dimensions,
                response.embedding.clone(),
            )
            .await;

        Ok(response)
    }

    async fn embed_batch(
        &self,
        requests: Vec<EmbeddingRequest>,
    ) -> EmbeddingResult<Vec<EmbeddingResponse>> {
        let mut slots: Vec<Option<EmbeddingResponse>> = Vec::with_capacity(requests.len());
        let mut misses = Vec::new();
        let mut miss_positions = Vec::new();

        for (position, request) in requests.into_iter().enumerate() {
            let model = self.model_for(&request);
            match self.cache.get(&request.text, &model, request.dimensions).await {
                Some(embedding) => slots.push(Some(EmbeddingResponse {
                    dimension: embedding.len(),
                    embedding,
                    model,
                    tokens_used: None,
                })),
                None => {
                    slots.push(None);
                    miss_positions.push(position);
                    misses.push(request);
                }
            }
        }

        debug!(
            "Batch of {}: {} cached, {} to embed",
            slots.len(),
            slots.len() - misses.len(),
            misses.len()
        );

        if !misses.is_empty() {
            let keys: Vec<(String, String, Option<usize>)> = misses
                .iter()
                .map(|r| (r.text.clone(), self.model_for(r), r.dimensions))
                .collect();
            let responses = self.provider.embed_batch(misses).await?;
            if responses.len() != keys.len() {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "expected {} embeddings, got {}",
                    keys.len(),
                    responses.len()
                )));
            }

            for ((position, (text, model, dimensions)), response) in
                miss_positions.into_iter().zip(keys).zip(responses)
            {
                self.cache
                    .put(&text, &model, dimensions, response.embedding.clone())
                    .await;
                slots[position] = Some(response);
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.ok_or_else(|| {
                    EmbeddingError::InvalidResponse("missing embedding in batch".to_string())
                })
            })
            .collect()
    }

    fn is_available(&self) -> bool {
        self.provider.is_available()
    }
}
