//! Per-message control flow: scope filter, command or query, state update.

use std::{sync::Arc, time::Duration};

use {
    threadsage_agents::Generator,
    threadsage_common::{
        PipelineError, PipelineResult,
        types::{InboundMessage, ReplyPayload},
    },
    threadsage_config::ThreadsageConfig,
    threadsage_memory::{
        embeddings::EmbeddingProvider,
        threads::{ThreadStore, resolve_all},
    },
    threadsage_retrieval::Retriever,
    threadsage_sessions::{ConversationTurn, DebugSnapshot, SessionState, SnapshotCandidate},
    tracing::{debug, info, warn},
};

use crate::{
    compose::{self, DEFAULT_PROMPT_TEMPLATE},
    scope::{self, Filtered},
    show_context::{self, NO_SNAPSHOT_NOTICE},
};

/// Reply sent for any failed query.
pub const FAILURE_REPLY: &str = "Something went wrong.";

#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    /// Only messages from this channel are handled.
    pub channel_id: String,
    pub show_context_command: String,
    /// Bound on a single generator call.
    pub generation_timeout: Duration,
    pub prompt_template: String,
    /// Turns replayed into each prompt.
    pub history_limit: usize,
}

impl DispatcherSettings {
    pub fn from_config(config: &ThreadsageConfig, prompt_template: Option<String>) -> Self {
        Self {
            channel_id: config.chat.channel_id.clone(),
            show_context_command: config.chat.show_context_command.clone(),
            generation_timeout: Duration::from_secs(config.generation.timeout_secs),
            prompt_template: prompt_template.unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string()),
            history_limit: config.session.history_limit,
        }
    }
}

/// What the dispatcher decided to do with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ignored(Filtered),
    Reply(ReplyPayload),
}

impl Outcome {
    pub fn reply(&self) -> Option<&ReplyPayload> {
        match self {
            Self::Reply(payload) => Some(payload),
            Self::Ignored(_) => None,
        }
    }
}

/// Owns the session and every collaborator needed to answer one question.
pub struct Dispatcher {
    retriever: Retriever,
    embedder: Arc<dyn EmbeddingProvider>,
    threads: Arc<dyn ThreadStore>,
    generator: Arc<dyn Generator>,
    session: SessionState,
    settings: DispatcherSettings,
}

impl Dispatcher {
    pub fn new(
        retriever: Retriever,
        embedder: Arc<dyn EmbeddingProvider>,
        threads: Arc<dyn ThreadStore>,
        generator: Arc<dyn Generator>,
        settings: DispatcherSettings,
    ) -> Self {
        Self {
            retriever,
            embedder,
            threads,
            generator,
            session: SessionState::new(settings.history_limit),
            settings,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    /// Handle one inbound message. Never fails: pipeline errors are logged
    /// and turned into [`FAILURE_REPLY`].
    pub async fn handle(&self, msg: &InboundMessage) -> Outcome {
        if let Err(reason) = scope::check_scope(&self.settings.channel_id, msg) {
            debug!(channel = %msg.channel_id, author = %msg.author_id, %reason, "ignoring message");
            return Outcome::Ignored(reason);
        }

        if scope::is_command(&msg.text, &self.settings.show_context_command) {
            return Outcome::Reply(self.show_context());
        }

        let question = msg.text.trim();
        info!(author = %msg.author_id, chars = question.len(), "new question");
        match self.answer(question).await {
            Ok(answer) => Outcome::Reply(ReplyPayload::text(answer)),
            Err(e) => {
                warn!(kind = %e.kind(), error = %e, "query failed");
                Outcome::Reply(ReplyPayload::text(FAILURE_REPLY))
            },
        }
    }

    fn show_context(&self) -> ReplyPayload {
        match self.session.snapshot() {
            Some(snapshot) => {
                ReplyPayload::text(show_context::render(&snapshot, self.generator.display_name()))
            },
            None => ReplyPayload::text(NO_SNAPSHOT_NOTICE),
        }
    }

    async fn answer(&self, question: &str) -> PipelineResult<String> {
        let query = self
            .embedder
            .embed(question)
            .await
            .map_err(|e| PipelineError::EmbeddingFailure(format!("{e:#}")))?;
        let selection = self.retriever.retrieve(query)?;

        let corpus = self.retriever.corpus();
        let candidates: Vec<SnapshotCandidate> = selection
            .retained
            .iter()
            .filter_map(|c| match corpus.id(c.index) {
                Some(id) => Some(SnapshotCandidate {
                    id: id.to_string(),
                    index: c.index,
                    score: c.score,
                    z_score: c.z_score,
                }),
                None => {
                    warn!(index = c.index, "candidate outside the corpus, dropping");
                    None
                },
            })
            .collect();

        let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
        let records = resolve_all(self.threads.as_ref(), &ids).await;
        if records.is_empty() {
            debug!("answering without retrieved context");
        }

        let snapshot = DebugSnapshot {
            question: question.to_string(),
            candidates,
            gap: selection.gap,
            formatted_context: compose::format_threads(&records),
        };
        let turns = self.session.recent_turns(self.settings.history_limit);
        let prompt = compose::build_prompt(
            &self.settings.prompt_template,
            &compose::format_history(&turns),
            question,
            &snapshot.formatted_context,
        );

        let result = self.generate(&prompt).await;
        match &result {
            Ok(answer) => {
                self.session
                    .commit_success(ConversationTurn::new(question, answer.as_str()), snapshot);
            },
            Err(e) if e.after_retrieval() => self.session.commit_snapshot(snapshot),
            Err(_) => {},
        }
        result
    }

    async fn generate(&self, prompt: &str) -> PipelineResult<String> {
        let timeout = self.settings.generation_timeout;
        match tokio::time::timeout(timeout, self.generator.generate(prompt)).await {
            Ok(Ok(text)) => {
                let text = compose::extract_response(&text);
                if text.is_empty() {
                    return Err(PipelineError::GenerationFailure("empty answer".into()));
                }
                Ok(text.to_string())
            },
            Ok(Err(e)) => Err(PipelineError::GenerationFailure(format!("{e:#}"))),
            Err(_) => Err(PipelineError::GenerationTimeout(timeout)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Mutex;

    use {
        super::*,
        async_trait::async_trait,
        threadsage_memory::threads::{InMemoryThreadStore, ThreadRecord},
        threadsage_retrieval::Corpus,
    };

    pub(crate) const CHANNEL: &str = "1375597403750797493";

    /// Maps known texts to fixed vectors; anything else fails.
    pub(crate) struct FixedEmbedder {
        pub(crate) dims: usize,
        pub(crate) known: Vec<(&'static str, Vec<f32>)>,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            self.known
                .iter()
                .find(|(t, _)| *t == text)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| anyhow::anyhow!("embedding backend unavailable"))
        }

        fn model_name(&self) -> &str {
            "fixed"
        }

        fn dimensions(&self) -> usize {
            self.dims
        }
    }

    /// Echoes a counter and records every prompt it was given.
    #[derive(Default)]
    pub(crate) struct RecordingGenerator {
        pub(crate) prompts: Mutex<Vec<String>>,
        pub(crate) fail: bool,
        pub(crate) delay: Option<Duration>,
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                anyhow::bail!("backend returned 500");
            }
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            Ok(format!("  answer {}\n", prompts.len()))
        }

        fn display_name(&self) -> &str {
            "Claude"
        }
    }

    /// Corpus of five threads along distinct axes; the "pick" query lands
    /// close to threads 0 and 1 and far from the rest.
    pub(crate) fn corpus() -> Corpus {
        let ids = ["t0", "t1", "t2", "t3", "t4"].map(String::from).to_vec();
        let vectors = vec![
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
            vec![0.0, 0.0, -1.0, 0.0],
        ];
        Corpus::new(ids, vectors).unwrap()
    }

    fn record(id: &str) -> ThreadRecord {
        ThreadRecord {
            id: id.into(),
            header: format!("question {id}"),
            content: format!("content {id}"),
            category: None,
        }
    }

    pub(crate) fn embedder() -> FixedEmbedder {
        FixedEmbedder {
            dims: 4,
            known: vec![
                ("pick", vec![0.7, 0.7, 0.1, 0.0]),
                ("wrong dims", vec![1.0, 0.0]),
                ("vague", vec![0.0; 4]),
            ],
        }
    }

    pub(crate) fn dispatcher_with(
        store: InMemoryThreadStore,
        generator: Arc<RecordingGenerator>,
    ) -> Dispatcher {
        let settings = DispatcherSettings {
            channel_id: CHANNEL.into(),
            show_context_command: "/show_context".into(),
            generation_timeout: Duration::from_millis(200),
            prompt_template: "H[{conversation}] Q[{question}] C[{context}]".into(),
            history_limit: 5,
        };
        Dispatcher::new(
            Retriever::new(Arc::new(corpus()), 20),
            Arc::new(embedder()),
            Arc::new(store),
            generator,
            settings,
        )
    }

    pub(crate) fn dispatcher() -> (Dispatcher, Arc<RecordingGenerator>) {
        let generator = Arc::new(RecordingGenerator::default());
        let store = InMemoryThreadStore::new(["t0", "t1", "t2", "t3", "t4"].map(record));
        (dispatcher_with(store, Arc::clone(&generator)), generator)
    }

    fn msg(text: &str) -> InboundMessage {
        InboundMessage::new(CHANNEL, "user-1", text)
    }

    fn reply_text(outcome: Outcome) -> String {
        outcome.reply().unwrap().text.clone()
    }

    #[tokio::test]
    async fn show_context_before_any_question() {
        let (d, _) = dispatcher();
        assert_eq!(reply_text(d.handle(&msg("/show_context")).await), NO_SNAPSHOT_NOTICE);
        assert!(d.session().recent_turns(5).is_empty());
    }

    #[tokio::test]
    async fn answers_with_retrieved_context() {
        let (d, generator) = dispatcher();
        let answer = reply_text(d.handle(&msg("  pick ")).await);
        assert_eq!(answer, "answer 1");

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(
            prompts[0],
            "H[] Q[pick] C[Closest Q: question t0\nA: content t0\n\nClosest Q: question t1\nA: content t1]"
        );

        let view = d.session().view();
        assert_eq!(view.turns, vec![ConversationTurn::new("pick", "answer 1")]);
        let snapshot = view.snapshot.unwrap();
        assert_eq!(snapshot.question, "pick");
        let ids: Vec<&str> = snapshot.candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["t0", "t1"]);
        assert!(snapshot.gap > 0.0);
    }

    #[tokio::test]
    async fn show_context_renders_last_snapshot() {
        let (d, _) = dispatcher();
        d.handle(&msg("pick")).await;
        let out = reply_text(d.handle(&msg("/SHOW_CONTEXT")).await);
        assert!(out.starts_with("```Auto Z-Score Threshold Based on Dropoff\n\n"));
        assert!(out.contains("Keeping top 2 threads"));
        assert!(out.contains("• t0 | z="));
        assert!(out.contains("Formatted Context Sent to Claude:"));
        assert_eq!(d.session().recent_turns(5).len(), 1);
    }

    #[tokio::test]
    async fn lookup_miss_does_not_abort_the_query() {
        let generator = Arc::new(RecordingGenerator::default());
        let store = InMemoryThreadStore::new([record("t1")]);
        let d = dispatcher_with(store, Arc::clone(&generator));

        assert_eq!(reply_text(d.handle(&msg("pick")).await), "answer 1");
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("C[Closest Q: question t1\nA: content t1]"));
        assert!(!prompts[0].contains("question t0"));
        // The snapshot still lists both retained candidates.
        assert_eq!(d.session().snapshot().unwrap().candidates.len(), 2);
    }

    #[tokio::test]
    async fn empty_store_still_generates() {
        let generator = Arc::new(RecordingGenerator::default());
        let d = dispatcher_with(InMemoryThreadStore::default(), Arc::clone(&generator));
        assert_eq!(reply_text(d.handle(&msg("pick")).await), "answer 1");
        assert!(generator.prompts.lock().unwrap()[0].ends_with("C[]"));
    }

    #[tokio::test]
    async fn flat_scores_retain_nothing_but_still_answer() {
        let (d, generator) = dispatcher();
        assert_eq!(reply_text(d.handle(&msg("vague")).await), "answer 1");
        assert!(generator.prompts.lock().unwrap()[0].ends_with("C[]"));

        let view = d.session().view();
        assert_eq!(view.turns.len(), 1);
        let snapshot = view.snapshot.unwrap();
        assert!(snapshot.candidates.is_empty());
        assert_eq!(snapshot.gap, 0.0);

        let out = reply_text(d.handle(&msg("/show_context")).await);
        assert!(out.contains("Keeping top 0 threads"), "{out}");
        assert!(out.contains("Formatted Context Sent to Claude:"), "{out}");
    }

    #[tokio::test]
    async fn history_replays_into_later_prompts() {
        let (d, generator) = dispatcher();
        for _ in 0..7 {
            d.handle(&msg("pick")).await;
        }
        let turns = d.session().recent_turns(5);
        let answers: Vec<&str> = turns.iter().map(|t| t.answer.as_str()).collect();
        assert_eq!(answers, vec!["answer 3", "answer 4", "answer 5", "answer 6", "answer 7"]);

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[1].starts_with("H[User: pick\nAssistant: answer 1\n]"));
        // Seventh prompt carries turns 2..=6.
        assert!(prompts[6].starts_with("H[User: pick\nAssistant: answer 2\n"));
        assert!(!prompts[6].contains("answer 1\n"));
    }

    #[tokio::test]
    async fn embedding_failure_keeps_prior_state() {
        let (d, _) = dispatcher();
        d.handle(&msg("pick")).await;
        assert_eq!(reply_text(d.handle(&msg("unknown text")).await), FAILURE_REPLY);

        let view = d.session().view();
        assert_eq!(view.turns.len(), 1);
        assert_eq!(view.snapshot.unwrap().question, "pick");
    }

    #[tokio::test]
    async fn dimension_mismatch_is_a_failed_query() {
        let (d, _) = dispatcher();
        assert_eq!(reply_text(d.handle(&msg("wrong dims")).await), FAILURE_REPLY);
        assert!(d.session().snapshot().is_none());
    }

    #[tokio::test]
    async fn generation_failure_records_only_the_snapshot() {
        let generator = Arc::new(RecordingGenerator {
            fail: true,
            ..Default::default()
        });
        let store = InMemoryThreadStore::new([record("t0"), record("t1")]);
        let d = dispatcher_with(store, generator);

        assert_eq!(reply_text(d.handle(&msg("pick")).await), FAILURE_REPLY);
        let view = d.session().view();
        assert!(view.turns.is_empty());
        assert_eq!(view.snapshot.unwrap().question, "pick");
    }

    #[tokio::test]
    async fn slow_generation_times_out() {
        let generator = Arc::new(RecordingGenerator {
            delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let d = dispatcher_with(InMemoryThreadStore::default(), generator);

        let started = std::time::Instant::now();
        assert_eq!(reply_text(d.handle(&msg("pick")).await), FAILURE_REPLY);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(d.session().recent_turns(5).is_empty());
        assert!(d.session().snapshot().is_some());
    }

    #[tokio::test]
    async fn out_of_scope_messages_are_ignored() {
        let (d, generator) = dispatcher();
        let other = InboundMessage::new("elsewhere", "user-1", "pick");
        assert_eq!(d.handle(&other).await, Outcome::Ignored(Filtered::WrongChannel));

        let mut own = msg("pick");
        own.from_self = true;
        assert_eq!(d.handle(&own).await, Outcome::Ignored(Filtered::SelfAuthored));

        assert!(generator.prompts.lock().unwrap().is_empty());
        assert!(d.session().snapshot().is_none());
    }

    #[tokio::test]
    async fn failures_do_not_poison_later_queries() {
        let (d, _) = dispatcher();
        d.handle(&msg("unknown text")).await;
        assert_eq!(reply_text(d.handle(&msg("pick")).await), "answer 1");
    }
}
