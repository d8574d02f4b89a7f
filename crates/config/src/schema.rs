//! Configuration schema. Every section has working defaults so a config file
//! only needs to name what differs; secrets come from the environment.

use std::path::PathBuf;

use {secrecy::Secret, serde::Deserialize};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThreadsageConfig {
    pub chat: ChatConfig,
    pub telegram: TelegramConfig,
    pub corpus: CorpusConfig,
    pub threads: ThreadsConfig,
    pub retrieval: RetrievalConfig,
    pub session: SessionConfig,
    pub embeddings: EmbeddingsConfig,
    pub generation: GenerationConfig,
}

/// Which conversation the bot serves and how it is driven.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChatConfig {
    /// The only channel whose messages are answered. Everything else is
    /// ignored.
    pub channel_id: String,
    /// Literal command (matched case-insensitively) that prints the last
    /// retrieval decision instead of asking a question.
    pub show_context_command: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            channel_id: String::new(),
            show_context_command: "/show_context".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot token. Usually supplied through `TELEGRAM_BOT_TOKEN`.
    pub token: Option<Secret<String>>,
}

/// Precomputed corpus produced by the ingestion job.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorpusConfig {
    /// `.npy` matrix of unit-length embeddings, one row per thread.
    pub embeddings: PathBuf,
    /// Thread ids, one per line, aligned with the matrix rows.
    pub ids: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            embeddings: PathBuf::from("models/embeddings.npy"),
            ids: PathBuf::from("models/id_map.txt"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThreadsConfig {
    /// SQLite database holding the `threads` table.
    pub db_path: PathBuf,
    pub max_connections: u32,
}

impl Default for ThreadsConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/threads.db"),
            max_connections: 4,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalConfig {
    /// How many top-scoring threads the drop-off is searched in.
    pub window_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { window_size: 20 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Turns remembered and replayed to the generator.
    pub history_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { history_limit: 5 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingsConfig {
    /// OpenAI-compatible base URL (`https://host`, `https://host/v1`, or the
    /// full `/embeddings` endpoint).
    pub base_url: String,
    /// Must be the model the corpus was embedded with.
    pub model: String,
    pub dimensions: usize,
    /// Send `dimensions` in the request so the backend truncates vectors.
    pub request_dimensions: bool,
    /// Usually supplied through `EMBEDDINGS_API_KEY` or `OPENAI_API_KEY`.
    pub api_key: Option<Secret<String>>,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            model: "text-embedding-3-small".into(),
            dimensions: 1536,
            request_dimensions: false,
            api_key: None,
        }
    }
}

/// Options passed to the text generator.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// OpenAI-compatible base URL serving `/chat/completions`.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature; `0.0` makes answers as repeatable as the backend allows.
    pub temperature: f32,
    /// Sample only from the `top_k` most likely tokens. Not every backend
    /// accepts this, so it is only sent when set.
    pub top_k: Option<u32>,
    /// Nucleus sampling mass.
    pub top_p: f32,
    /// Generation stops at the first of these sequences.
    pub stop_sequences: Vec<String>,
    /// A generation that takes longer than this counts as failed.
    pub timeout_secs: u64,
    /// Name shown in the context debug output.
    pub display_name: String,
    /// Optional prompt template file with `{conversation}`, `{question}` and
    /// `{context}` placeholders. The built-in template is used when unset.
    pub prompt_template: Option<PathBuf>,
    /// Usually supplied through `GENERATION_API_KEY` or `OPENAI_API_KEY`.
    pub api_key: Option<Secret<String>>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            model: "gpt-4o-mini".into(),
            max_tokens: 2048,
            temperature: 0.0,
            top_k: None,
            top_p: 0.9,
            stop_sequences: vec!["\n\nHuman".into()],
            timeout_secs: 60,
            display_name: "Assistant".into(),
            prompt_template: None,
            api_key: None,
        }
    }
}
