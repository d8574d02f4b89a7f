//! Generation over any OpenAI-compatible `/v1/chat/completions` endpoint.
//!
//! The prompt is sent as a single user message; the first choice's content is
//! the answer.

use async_trait::async_trait;
use {
    secrecy::{ExposeSecret, Secret},
    serde::Serialize,
    threadsage_common::http::api_endpoint,
    tracing::debug,
};

use crate::generator::{GenerationOptions, Generator};

pub struct OpenAiCompatGenerator {
    client: reqwest::Client,
    api_key: Secret<String>,
    base_url: String,
    display_name: String,
    options: GenerationOptions,
}

impl OpenAiCompatGenerator {
    pub fn new(api_key: Secret<String>, options: GenerationOptions) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: "https://api.openai.com".into(),
            display_name: options.model.clone(),
            options,
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    pub fn with_display_name(mut self, name: String) -> Self {
        self.display_name = name;
        self
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

fn completion_text(body: &serde_json::Value) -> anyhow::Result<String> {
    let text = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("completion response has no message content"))?
        .trim();
    if text.is_empty() {
        anyhow::bail!("completion response was empty");
    }
    Ok(text.to_string())
}

#[async_trait]
impl Generator for OpenAiCompatGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let opts = &self.options;
        let req = ChatRequest {
            model: &opts.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: opts.max_tokens,
            temperature: opts.temperature,
            top_p: opts.top_p,
            top_k: opts.top_k,
            stop: (!opts.stop_sequences.is_empty()).then_some(opts.stop_sequences.as_slice()),
        };

        let body = self
            .client
            .post(api_endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let text = completion_text(&body)?;
        debug!(
            model = %opts.model,
            prompt_chars = prompt.len(),
            answer_chars = text.len(),
            "generated answer"
        );
        Ok(text)
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }
}
