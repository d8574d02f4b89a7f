//! Per-conversation state: the capped turn history and the snapshot of the
//! last retrieval decision.

pub mod history;
pub mod snapshot;
pub mod state;

pub use {
    history::{ConversationTurn, DEFAULT_HISTORY_LIMIT, History},
    snapshot::{DebugSnapshot, SnapshotCandidate},
    state::{SessionState, SessionView},
};
