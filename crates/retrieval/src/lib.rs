//! Retrieval core: corpus → dot-product scores → z-score drop-off selection.

pub mod corpus;
pub mod npy;
pub mod scorer;
pub mod threshold;

use std::sync::Arc;

use {threadsage_common::PipelineResult, tracing::debug};

pub use {
    corpus::{Corpus, CorpusError},
    threshold::{DEFAULT_WINDOW_SIZE, RankedCandidate, Selection},
};

/// Scores a query against a shared, immutable corpus and keeps the candidates
/// that sit above the largest drop in z-score.
#[derive(Debug, Clone)]
pub struct Retriever {
    corpus: Arc<Corpus>,
    window_size: usize,
}

impl Retriever {
    pub fn new(corpus: Arc<Corpus>, window_size: usize) -> Self {
        Self {
            corpus,
            window_size,
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Normalize `query` to unit length, score it and select the retained set.
    pub fn retrieve(&self, mut query: Vec<f32>) -> PipelineResult<Selection> {
        scorer::l2_normalize(&mut query);
        let scores = scorer::score(&query, &self.corpus)?;
        let selection = threshold::select(&scores, self.window_size);
        debug!(
            corpus = self.corpus.len(),
            window = self.window_size,
            retained = selection.retained.len(),
            gap = selection.gap,
            "selected threads"
        );
        Ok(selection)
    }
}
