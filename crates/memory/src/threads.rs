//! Thread store gateway: resolve corpus ids to the stored header/content.

use std::collections::HashMap;

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

/// A stored unit of prior knowledge (a Q&A thread or a course section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub id: String,
    pub header: String,
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Read-only key → thread lookup.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// `Ok(None)` when the id is unknown to the store.
    async fn lookup(&self, id: &str) -> anyhow::Result<Option<ThreadRecord>>;
}

/// Resolve `ids` in order, dropping the ones the store cannot produce.
///
/// The corpus index and the store are loaded independently and may disagree,
/// so neither a miss nor a failed lookup aborts the batch.
pub async fn resolve_all<S>(store: &S, ids: &[&str]) -> Vec<ThreadRecord>
where
    S: ThreadStore + ?Sized,
{
    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        match store.lookup(id).await {
            Ok(Some(record)) => records.push(record),
            Ok(None) => debug!(id, "thread missing from store, dropping candidate"),
            Err(e) => warn!(id, error = %e, "thread lookup failed, dropping candidate"),
        }
    }
    records
}

/// Thread store backed by a `HashMap`, for tests and small fixed corpora.
#[derive(Debug, Default, Clone)]
pub struct InMemoryThreadStore {
    threads: HashMap<String, ThreadRecord>,
}

impl InMemoryThreadStore {
    pub fn new(records: impl IntoIterator<Item = ThreadRecord>) -> Self {
        Self {
            threads: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    /// Load a JSON array of thread records.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let records: Vec<ThreadRecord> = serde_json::from_str(json)?;
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    async fn lookup(&self, id: &str) -> anyhow::Result<Option<ThreadRecord>> {
        Ok(self.threads.get(id).cloned())
    }
}
