use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, info},
};

use crate::schema::ThreadsageConfig;

pub const CONFIG_FILE_NAME: &str = "threadsage.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Platform config directory (e.g. `~/.config/threadsage` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "threadsage", "threadsage")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Locate the config file: the explicit path if given, otherwise
/// `./threadsage.toml`, otherwise the platform config directory.
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

pub fn parse_config(text: &str, path: &Path) -> Result<ThreadsageConfig, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load, overlay the process environment, and validate.
pub fn load_config(explicit: Option<&Path>) -> Result<ThreadsageConfig, ConfigError> {
    let mut config = match find_config_file(explicit) {
        Some(path) => {
            let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "loaded config");
            parse_config(&text, &path)?
        },
        None => {
            debug!("no config file found, using defaults");
            ThreadsageConfig::default()
        },
    };
    apply_env(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;
    Ok(config)
}

/// Overlay values from the environment. Secrets are expected to live there
/// rather than in the file.
pub fn apply_env(config: &mut ThreadsageConfig, var: impl Fn(&str) -> Option<String>) {
    let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

    if let Some(token) = non_empty("TELEGRAM_BOT_TOKEN") {
        config.telegram.token = Some(Secret::new(token));
    }
    if let Some(channel) = non_empty("THREADSAGE_CHANNEL_ID") {
        config.chat.channel_id = channel;
    }
    if let Some(key) = non_empty("EMBEDDINGS_API_KEY").or_else(|| non_empty("OPENAI_API_KEY")) {
        config.embeddings.api_key = Some(Secret::new(key));
    }
    if let Some(key) = non_empty("GENERATION_API_KEY").or_else(|| non_empty("OPENAI_API_KEY")) {
        config.generation.api_key = Some(Secret::new(key));
    }
}

pub fn validate(config: &ThreadsageConfig) -> Result<(), ConfigError> {
    if config.retrieval.window_size == 0 {
        return Err(ConfigError::Invalid("retrieval.window_size must be at least 1".into()));
    }
    if config.embeddings.dimensions == 0 {
        return Err(ConfigError::Invalid("embeddings.dimensions must be at least 1".into()));
    }
    if config.generation.timeout_secs == 0 {
        return Err(ConfigError::Invalid("generation.timeout_secs must be at least 1".into()));
    }
    if config.chat.show_context_command.trim().is_empty() {
        return Err(ConfigError::Invalid("chat.show_context_command must not be empty".into()));
    }
    Ok(())
}
