use serde::Serialize;

/// One retained candidate as it was presented to the generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotCandidate {
    /// Thread id the corpus row belongs to.
    pub id: String,
    pub index: usize,
    pub score: f32,
    pub z_score: f64,
}

/// What the last retrieval decided and what context it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugSnapshot {
    pub question: String,
    pub candidates: Vec<SnapshotCandidate>,
    pub gap: f64,
    pub formatted_context: String,
}

/// Single-value slot, replaced wholesale.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSlot {
    current: Option<DebugSnapshot>,
}

impl SnapshotSlot {
    pub fn set(&mut self, snapshot: DebugSnapshot) {
        self.current = Some(snapshot);
    }

    pub fn get(&self) -> Option<&DebugSnapshot> {
        self.current.as_ref()
    }
}
