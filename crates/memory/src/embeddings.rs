use async_trait::async_trait;

/// Turns text into an embedding vector.
///
/// Implementations are expected to be deterministic for a fixed model and
/// text; they may fail transiently (network, quota).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    fn model_name(&self) -> &str;

    /// Length of the vectors this provider returns.
    fn dimensions(&self) -> usize;
}
