//! Embeddings over any OpenAI-compatible `/v1/embeddings` endpoint.

use async_trait::async_trait;
use {
    secrecy::ExposeSecret,
    serde::{Deserialize, Serialize},
    threadsage_common::http::api_endpoint,
    tracing::debug,
};

use crate::embeddings::EmbeddingProvider;

pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    api_key: secrecy::Secret<String>,
    base_url: String,
    model: String,
    dims: usize,
    /// Ask the backend to shorten vectors to `dims` (text-embedding-3 models).
    request_dimensions: bool,
}

impl OpenAiEmbeddingProvider {
    pub fn new(api_key: secrecy::Secret<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: "https://api.openai.com".into(),
            model: "text-embedding-3-small".into(),
            dims: 1536,
            request_dimensions: false,
        }
    }

    pub fn with_model(mut self, model: String, dims: usize) -> Self {
        self.model = model;
        self.dims = dims;
        self
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    pub fn with_requested_dimensions(mut self, enabled: bool) -> Self {
        self.request_dimensions = enabled;
        self
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let req = EmbeddingRequest {
            model: &self.model,
            input: [text],
            dimensions: self.request_dimensions.then_some(self.dims),
        };

        let resp = self
            .client
            .post(api_endpoint(&self.base_url, "embeddings"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json::<EmbeddingResponse>()
            .await?;

        let embedding = resp
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| anyhow::anyhow!("empty embedding response"))?;
        if embedding.len() != self.dims {
            anyhow::bail!(
                "model {} returned {} dimensions, expected {}",
                self.model,
                embedding.len(),
                self.dims
            );
        }
        debug!(model = %self.model, dims = embedding.len(), "embedded query");
        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}
