use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evaluation::EvaluationRecord;

/// A saved record with the timestamps the store assigned to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvaluation {
    pub record: EvaluationRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// On-disk document holding every saved evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreState {
    pub version: u32,
    #[serde(default)]
    pub evaluations: Vec<StoredEvaluation>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreState {
    /// Create a new empty store state with version 1
    pub fn new() -> Self {
        Self {
            version: 1,
            evaluations: Vec::new(),
        }
    }

    pub fn find(&self, id: &str) -> Option<&StoredEvaluation> {
        self.evaluations.iter().find(|e| e.record.id() == id)
    }

    /// Append a record. Returns false if the id is already present.
    pub fn insert(&mut self, record: EvaluationRecord, now: DateTime<Utc>) -> bool {
        if self.find(record.id()).is_some() {
            return false;
        }
        self.evaluations.push(StoredEvaluation {
            record,
            created_at: now,
            updated_at: now,
        });
        true
    }

    /// Replace a record with the same id, keeping its creation time.
    /// Returns false if no such record exists.
    pub fn replace(&mut self, record: EvaluationRecord, now: DateTime<Utc>) -> bool {
        match self
            .evaluations
            .iter_mut()
            .find(|e| e.record.id() == record.id())
        {
            Some(entry) => {
                entry.record = record;
                entry.updated_at = now;
                true
            }
            None => false,
        }
    }

    /// Remove a record. Returns true if it existed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.evaluations.len();
        self.evaluations.retain(|e| e.record.id() != id);
        self.evaluations.len() != before
    }

    /// All evaluations, newest first
    pub fn newest_first(&self) -> Vec<StoredEvaluation> {
        let mut all = self.evaluations.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }
}
