//! Startup wiring: config → corpus, thread store, providers → dispatcher.

use std::{path::Path, sync::Arc};

use {
    anyhow::Context,
    threadsage_agents::{GenerationOptions, Generator, providers::OpenAiCompatGenerator},
    threadsage_auto_reply::{Dispatcher, DispatcherSettings},
    threadsage_config::ThreadsageConfig,
    threadsage_memory::{
        embeddings::EmbeddingProvider,
        embeddings_openai::OpenAiEmbeddingProvider,
        threads::{InMemoryThreadStore, ThreadStore},
        threads_sqlite::SqliteThreadStore,
    },
    threadsage_retrieval::{Corpus, Retriever},
    tracing::info,
};

/// Load the corpus and make sure it matches the configured embedding model.
pub fn load_corpus(config: &ThreadsageConfig) -> anyhow::Result<Arc<Corpus>> {
    let corpus = Corpus::load(&config.corpus.embeddings, &config.corpus.ids)?;
    if corpus.dims() != config.embeddings.dimensions {
        anyhow::bail!(
            "corpus has {} dimensions but embeddings.dimensions is {}",
            corpus.dims(),
            config.embeddings.dimensions
        );
    }
    Ok(Arc::new(corpus))
}

/// The embedding model must produce vectors the corpus can be scored against.
pub fn ensure_dimensions(
    corpus: &Corpus,
    embedder: &dyn EmbeddingProvider,
) -> anyhow::Result<()> {
    if corpus.dims() != embedder.dimensions() {
        anyhow::bail!(
            "corpus has {} dimensions but {} produces {}",
            corpus.dims(),
            embedder.model_name(),
            embedder.dimensions()
        );
    }
    Ok(())
}

/// Thread store from a JSON file when given, otherwise the configured SQLite
/// database.
pub async fn open_thread_store(
    config: &ThreadsageConfig,
    threads_json: Option<&Path>,
) -> anyhow::Result<Arc<dyn ThreadStore>> {
    if let Some(path) = threads_json {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let store = InMemoryThreadStore::from_json(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        info!(path = %path.display(), threads = store.len(), "loaded threads from json");
        return Ok(Arc::new(store));
    }
    let store = SqliteThreadStore::open(&config.threads.db_path, config.threads.max_connections)
        .await
        .with_context(|| format!("opening {}", config.threads.db_path.display()))?;
    Ok(Arc::new(store))
}

pub fn embedder(config: &mut ThreadsageConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let cfg = &mut config.embeddings;
    let api_key = cfg
        .api_key
        .take()
        .context("set EMBEDDINGS_API_KEY or OPENAI_API_KEY")?;
    let provider = OpenAiEmbeddingProvider::new(api_key)
        .with_base_url(cfg.base_url.clone())
        .with_model(cfg.model.clone(), cfg.dimensions)
        .with_requested_dimensions(cfg.request_dimensions);
    Ok(Arc::new(provider))
}

pub fn generator(config: &mut ThreadsageConfig) -> anyhow::Result<Arc<dyn Generator>> {
    let cfg = &mut config.generation;
    let api_key = cfg
        .api_key
        .take()
        .context("set GENERATION_API_KEY or OPENAI_API_KEY")?;
    let provider = OpenAiCompatGenerator::new(api_key, GenerationOptions::from_config(cfg))
        .with_base_url(cfg.base_url.clone())
        .with_display_name(cfg.display_name.clone());
    Ok(Arc::new(provider))
}

pub fn prompt_template(config: &ThreadsageConfig) -> anyhow::Result<Option<String>> {
    config
        .generation
        .prompt_template
        .as_deref()
        .map(|path| {
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        })
        .transpose()
}

/// Build a ready dispatcher. Secrets are moved out of `config`.
pub async fn build_dispatcher(
    config: &mut ThreadsageConfig,
    threads_json: Option<&Path>,
) -> anyhow::Result<Dispatcher> {
    let corpus = Arc::new(Corpus::load(&config.corpus.embeddings, &config.corpus.ids)?);
    let embedder = embedder(config)?;
    ensure_dimensions(&corpus, embedder.as_ref())?;
    let threads = open_thread_store(config, threads_json).await?;
    let settings = DispatcherSettings::from_config(config, prompt_template(config)?);
    let retriever = Retriever::new(corpus, config.retrieval.window_size);
    let generator = generator(config)?;
    info!(
        channel = %settings.channel_id,
        window = retriever.window_size(),
        embedding_model = embedder.model_name(),
        generator = generator.display_name(),
        "dispatcher ready"
    );
    Ok(Dispatcher::new(retriever, embedder, threads, generator, settings))
}

/// Summary printed by `threadsage check`.
#[derive(Debug)]
pub struct CheckReport {
    pub corpus_rows: usize,
    pub corpus_dims: usize,
    pub off_unit_norm: usize,
    pub stored_threads: Option<i64>,
    pub embeddings_key: bool,
    pub generation_key: bool,
    pub telegram_token: bool,
}

/// Load everything that can be checked offline.
pub async fn check(config: &ThreadsageConfig) -> anyhow::Result<CheckReport> {
    let corpus = load_corpus(config)?;
    let stored_threads = if config.threads.db_path.is_file() {
        let store =
            SqliteThreadStore::open(&config.threads.db_path, config.threads.max_connections)
                .await?;
        Some(store.count().await?)
    } else {
        None
    };
    Ok(CheckReport {
        corpus_rows: corpus.len(),
        corpus_dims: corpus.dims(),
        off_unit_norm: corpus.rows_off_unit_norm(threadsage_retrieval::corpus::NORM_TOLERANCE),
        stored_threads,
        embeddings_key: config.embeddings.api_key.is_some(),
        generation_key: config.generation.api_key.is_some(),
        telegram_token: config.telegram.token.is_some(),
    })
}
