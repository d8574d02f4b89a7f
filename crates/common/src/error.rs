use std::time::Duration;

/// Failures that abort a single query.
///
/// Per-candidate lookup misses and empty retrievals are not errors; they are
/// logged where they happen and the query continues with whatever context is
/// left.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("query has {actual} dimensions, corpus has {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    #[error("generation failed: {0}")]
    GenerationFailure(String),

    #[error("generation timed out after {0:?}")]
    GenerationTimeout(Duration),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Coarse classification used for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    DimensionMismatch,
    Embedding,
    Generation,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DimensionMismatch => "dimension_mismatch",
            Self::Embedding => "embedding",
            Self::Generation => "generation",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::DimensionMismatch { .. } => FailureKind::DimensionMismatch,
            Self::EmbeddingFailure(_) => FailureKind::Embedding,
            Self::GenerationFailure(_) | Self::GenerationTimeout(_) => FailureKind::Generation,
        }
    }

    /// Whether the retrieval half of the pipeline had already finished when
    /// this error was raised.
    pub fn after_retrieval(&self) -> bool {
        self.kind() == FailureKind::Generation
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(PipelineError::DimensionMismatch { expected: 384, actual: 3 }, FailureKind::DimensionMismatch, false)]
    #[case(PipelineError::EmbeddingFailure("503".into()), FailureKind::Embedding, false)]
    #[case(PipelineError::GenerationFailure("bad gateway".into()), FailureKind::Generation, true)]
    #[case(PipelineError::GenerationTimeout(Duration::from_secs(30)), FailureKind::Generation, true)]
    fn classifies_failures(
        #[case] err: PipelineError,
        #[case] kind: FailureKind,
        #[case] after_retrieval: bool,
    ) {
        assert_eq!(err.kind(), kind);
        assert_eq!(err.after_retrieval(), after_retrieval);
    }

    #[test]
    fn dimension_mismatch_message_names_both_sizes() {
        let err = PipelineError::DimensionMismatch {
            expected: 384,
            actual: 3,
        };
        assert_eq!(err.to_string(), "query has 3 dimensions, corpus has 384");
    }

    #[test]
    fn timeout_is_a_generation_failure() {
        let err = PipelineError::GenerationTimeout(Duration::from_secs(2));
        assert_eq!(err.kind().to_string(), "generation");
    }
}
