use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::{
    history::{ConversationTurn, History},
    snapshot::{DebugSnapshot, SnapshotSlot},
};

#[derive(Debug, Default)]
struct Inner {
    history: History,
    snapshot: SnapshotSlot,
}

/// Conversation memory for the single active conversation.
///
/// History and the debug snapshot share one lock, so a finished query lands
/// both its turn and its snapshot together and readers never see one without
/// the other. The lock is only held for copies and swaps, never across I/O.
#[derive(Debug, Default)]
pub struct SessionState {
    inner: Mutex<Inner>,
}

/// A consistent copy of the session taken under one lock acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub turns: Vec<ConversationTurn>,
    pub snapshot: Option<DebugSnapshot>,
}

impl SessionState {
    pub fn new(history_limit: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                history: History::new(history_limit),
                snapshot: SnapshotSlot::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // State is only ever replaced whole, so a panicked writer cannot
        // leave it half-updated.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The last `n` turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> Vec<ConversationTurn> {
        self.lock().history.recent(n).cloned().collect()
    }

    pub fn snapshot(&self) -> Option<DebugSnapshot> {
        self.lock().snapshot.get().cloned()
    }

    pub fn view(&self) -> SessionView {
        let inner = self.lock();
        SessionView {
            turns: inner.history.recent(inner.history.len()).cloned().collect(),
            snapshot: inner.snapshot.get().cloned(),
        }
    }

    /// Record a successfully answered query.
    pub fn commit_success(&self, turn: ConversationTurn, snapshot: DebugSnapshot) {
        let mut inner = self.lock();
        inner.history.append(turn);
        inner.snapshot.set(snapshot);
        debug!(turns = inner.history.len(), "recorded turn");
    }

    /// Record the retrieval of a query whose answer could not be produced.
    pub fn commit_snapshot(&self, snapshot: DebugSnapshot) {
        self.lock().snapshot.set(snapshot);
    }
}
