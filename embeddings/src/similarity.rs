//! Similarity computation for embeddings.
//!
//! The index ranks by cosine similarity. Stored vectors are normalized to unit
//! length, so ranking a normalized query reduces to a dot product.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::corpus::Record;
use crate::error::{IndexError, Result};

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors (or a zero vector on either side)
/// - -1.0 means opposite vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;

    let dot = raw_dot(a, b);
    let magnitude_a = magnitude(a);
    let magnitude_b = magnitude(b);

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (magnitude_a * magnitude_b))
}

/// Compute the dot product between two embeddings.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;
    Ok(raw_dot(a, b))
}

/// Normalize an embedding to unit length. Zero vectors are left untouched.
pub fn normalize(embedding: &mut [f32]) {
    let magnitude = magnitude(embedding);
    if magnitude > 0.0 {
        for x in embedding.iter_mut() {
            *x /= magnitude;
        }
    }
}

fn check_dimensions(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(IndexError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

fn raw_dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// A similarity search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// The matched record.
    pub record: Record,

    /// Cosine similarity to the query.
    pub score: f32,
}

impl SimilarityResult {
    /// Create a new similarity result.
    pub fn new(record: Record, score: f32) -> Self {
        Self { record, score }
    }
}

/// Order scored candidates best-first and keep the top `k`.
///
/// Higher scores come first; equal scores are ordered by ascending record id.
pub fn rank_top_k<'a, I>(scored: I, k: usize) -> Vec<SimilarityResult>
where
    I: IntoIterator<Item = (&'a Record, f32)>,
{
    let mut ranked: Vec<(&Record, OrderedFloat<f32>)> = scored
        .into_iter()
        .map(|(record, score)| (record, OrderedFloat(score)))
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));

    ranked
        .into_iter()
        .take(k)
        .map(|(record, score)| SimilarityResult::new(record.clone(), score.0))
        .collect()
}
