//! Deterministic providers shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use wordsim_embeddings::{
    EmbeddingError, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, EmbeddingResult,
};

/// Hand-picked 3-d vectors: axis 0 is "fruit", axis 1 is "vehicle".
pub const FRUIT_TABLE: &[(&str, [f32; 3])] = &[
    ("apple", [0.90, 0.10, 0.05]),
    ("banana", [0.85, 0.05, 0.20]),
    ("orange", [0.80, 0.15, 0.25]),
    ("car", [0.10, 0.95, 0.05]),
    ("bus", [0.05, 0.90, 0.20]),
    ("fruit", [1.00, 0.00, 0.10]),
];

pub const FRUIT_CORPUS: &[&str] = &["apple", "banana", "orange", "car", "bus"];

/// Looks texts up in a fixed table and fails for anything unknown.
pub struct TableProvider {
    table: HashMap<String, Vec<f32>>,
    dimension: usize,
    calls: AtomicUsize,
}

impl TableProvider {
    pub fn new(entries: &[(&str, [f32; 3])]) -> Self {
        let table = entries
            .iter()
            .map(|(text, v)| (text.to_string(), v.to_vec()))
            .collect();
        Self {
            table,
            dimension: 3,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fruit() -> Self {
        Self::new(FRUIT_TABLE)
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.table.insert(text.to_string(), vector);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for TableProvider {
    fn name(&self) -> &str {
        "table"
    }

    fn default_model(&self) -> &str {
        "table-3d"
    }

    fn default_dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, request: EmbeddingRequest) -> EmbeddingResult<EmbeddingResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let embedding = self.table.get(&request.text).cloned().ok_or_else(|| {
            EmbeddingError::ApiRequest {
                status: 500,
                message: format!("no vector for {:?}", request.text),
            }
        })?;
        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: "table-3d".to_string(),
            tokens_used: None,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Derives a vector from the bytes of the text, so any string embeds.
///
/// Equal texts get equal vectors; distinct texts usually differ.
pub struct ByteHashProvider;

pub fn byte_hash_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; 8];
    for (i, b) in text.bytes().enumerate() {
        v[(i + b as usize) % 8] += f32::from(b) / 255.0;
    }
    v[0] += 0.01;
    v
}

#[async_trait]
impl EmbeddingProvider for ByteHashProvider {
    fn name(&self) -> &str {
        "byte-hash"
    }

    fn default_model(&self) -> &str {
        "byte-hash-8"
    }

    fn default_dimension(&self) -> usize {
        8
    }

    async fn embed(&self, request: EmbeddingRequest) -> EmbeddingResult<EmbeddingResponse> {
        let embedding = byte_hash_vector(&request.text);
        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: "byte-hash-8".to_string(),
            tokens_used: None,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}
