//! Configuration: `threadsage.toml` plus environment overrides.

pub mod loader;
pub mod schema;

pub use {
    loader::{ConfigError, load_config},
    schema::{
        ChatConfig, CorpusConfig, EmbeddingsConfig, GenerationConfig, RetrievalConfig,
        SessionConfig, TelegramConfig, ThreadsConfig, ThreadsageConfig,
    },
};
