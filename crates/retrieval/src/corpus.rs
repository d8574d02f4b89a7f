//! The in-memory corpus: precomputed thread embeddings plus the id of the
//! thread each row belongs to. Loaded once, never mutated.

use std::path::Path;

use tracing::{info, warn};

use crate::{
    npy::{self, NpyError},
    scorer::l2_norm,
};

/// Rows whose norm is further than this from 1.0 are reported at load time.
pub const NORM_TOLERANCE: f32 = 1e-3;

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Npy {
        path: String,
        #[source]
        source: NpyError,
    },
    #[error("{vectors} embedding rows but {ids} ids")]
    LengthMismatch { vectors: usize, ids: usize },
    #[error("row {row} has {actual} dimensions, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("row {row} contains a NaN or infinite component")]
    NonFinite { row: usize },
    #[error("corpus is empty")]
    Empty,
}

/// Embedding rows stored contiguously, index-aligned with `ids`.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    ids: Vec<String>,
    vectors: Vec<f32>,
    dims: usize,
}

impl Corpus {
    /// Build a corpus from one vector per id.
    pub fn new(ids: Vec<String>, vectors: Vec<Vec<f32>>) -> Result<Self, CorpusError> {
        if ids.len() != vectors.len() {
            return Err(CorpusError::LengthMismatch {
                vectors: vectors.len(),
                ids: ids.len(),
            });
        }
        let dims = vectors.first().map(Vec::len).ok_or(CorpusError::Empty)?;
        let mut flat = Vec::with_capacity(dims * vectors.len());
        for (row, v) in vectors.into_iter().enumerate() {
            if v.len() != dims {
                return Err(CorpusError::RaggedRow {
                    row,
                    expected: dims,
                    actual: v.len(),
                });
            }
            flat.extend(v);
        }
        Self::from_flat(ids, flat, dims)
    }

    /// Build a corpus from a row-major buffer of `ids.len() * dims` floats.
    pub fn from_flat(
        ids: Vec<String>,
        vectors: Vec<f32>,
        dims: usize,
    ) -> Result<Self, CorpusError> {
        if ids.is_empty() || dims == 0 {
            return Err(CorpusError::Empty);
        }
        let rows = vectors.len() / dims;
        if rows != ids.len() || vectors.len() % dims != 0 {
            return Err(CorpusError::LengthMismatch {
                vectors: rows,
                ids: ids.len(),
            });
        }
        if let Some(row) = vectors
            .chunks_exact(dims)
            .position(|row| row.iter().any(|x| !x.is_finite()))
        {
            return Err(CorpusError::NonFinite { row });
        }
        Ok(Self { ids, vectors, dims })
    }

    /// Load an `.npy` embedding matrix and its newline-separated id map.
    pub fn load(embeddings_path: &Path, ids_path: &Path) -> Result<Self, CorpusError> {
        let bytes = std::fs::read(embeddings_path).map_err(|source| CorpusError::Io {
            path: embeddings_path.display().to_string(),
            source,
        })?;
        let matrix = npy::parse(&bytes).map_err(|source| CorpusError::Npy {
            path: embeddings_path.display().to_string(),
            source,
        })?;
        let id_text = std::fs::read_to_string(ids_path).map_err(|source| CorpusError::Io {
            path: ids_path.display().to_string(),
            source,
        })?;
        let ids: Vec<String> = id_text.lines().map(str::to_string).collect();

        if matrix.rows != ids.len() {
            return Err(CorpusError::LengthMismatch {
                vectors: matrix.rows,
                ids: ids.len(),
            });
        }

        let corpus = Self::from_flat(ids, matrix.data, matrix.cols)?;
        let off_norm = corpus.rows_off_unit_norm(NORM_TOLERANCE);
        if off_norm > 0 {
            warn!(
                rows = off_norm,
                path = %embeddings_path.display(),
                "corpus rows are not unit length, scores will not be cosine similarities"
            );
        }
        info!(
            rows = corpus.len(),
            dims = corpus.dims(),
            path = %embeddings_path.display(),
            "loaded corpus"
        );
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn id(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    pub fn vector(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.dims)?;
        self.vectors.get(start..start + self.dims)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.vectors.chunks_exact(self.dims)
    }

    /// Number of rows whose L2 norm differs from 1.0 by more than `tolerance`.
    pub fn rows_off_unit_norm(&self, tolerance: f32) -> usize {
        self.rows()
            .filter(|row| {
                let drift = (l2_norm(row) - 1.0).abs();
                drift.is_nan() || drift > tolerance
            })
            .count()
    }
}
