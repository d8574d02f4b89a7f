//! Relevance scoring. Every stored and query vector is unit length, so the dot
//! product is the cosine similarity.

use threadsage_common::{PipelineError, PipelineResult};

use crate::corpus::Corpus;

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale `v` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 && norm.is_finite() {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Score `query` against every corpus row, preserving corpus order.
///
/// Rounding can push the dot product of two unit vectors a hair past ±1, so
/// the result is clamped to the cosine range.
pub fn score(query: &[f32], corpus: &Corpus) -> PipelineResult<Vec<f32>> {
    if query.len() != corpus.dims() {
        return Err(PipelineError::DimensionMismatch {
            expected: corpus.dims(),
            actual: query.len(),
        });
    }
    Ok(corpus
        .rows()
        .map(|row| dot(query, row).clamp(-1.0, 1.0))
        .collect())
}
