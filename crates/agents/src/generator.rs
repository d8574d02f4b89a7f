use async_trait::async_trait;

use threadsage_config::GenerationConfig;

/// Produces an answer for a fully assembled prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the generated text, already trimmed of surrounding whitespace.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;

    /// Human-readable backend name for debug output.
    fn display_name(&self) -> &str;
}

/// Sampling options sent with every generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Model identifier understood by the backend.
    pub model: String,
    /// Hard cap on generated tokens.
    pub max_tokens: u32,
    /// `0.0` picks the most likely token at each step.
    pub temperature: f32,
    /// Restricts sampling to the `k` most likely tokens. Omitted from the
    /// request when `None`.
    pub top_k: Option<u32>,
    /// Restricts sampling to the smallest token set whose mass exceeds `top_p`.
    pub top_p: f32,
    /// Generation ends at the first occurrence of any of these.
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

impl GenerationOptions {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            stop_sequences: config.stop_sequences.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_config() {
        let config = GenerationConfig {
            model: "claude-3-haiku".into(),
            top_k: Some(250),
            ..Default::default()
        };
        let opts = GenerationOptions::from_config(&config);
        assert_eq!(opts.model, "claude-3-haiku");
        assert_eq!(opts.top_k, Some(250));
        assert_eq!(opts.max_tokens, 2048);
        assert_eq!(opts.stop_sequences, vec!["\n\nHuman".to_string()]);
    }
}
