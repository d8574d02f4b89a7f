use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Turns kept for prompt assembly.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// Upper bound on the up-front allocation; larger limits grow on demand.
const MAX_PREALLOCATED: usize = 64;

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}

impl ConversationTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Append-only conversation log that forgets its oldest turns past `limit`.
#[derive(Debug, Clone)]
pub struct History {
    turns: VecDeque<ConversationTurn>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(limit.saturating_add(1).min(MAX_PREALLOCATED)),
            limit,
        }
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.limit {
            self.turns.pop_front();
        }
    }

    /// The last `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter().skip(self.turns.len().saturating_sub(n))
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
