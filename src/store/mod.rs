pub mod file;
pub mod types;

pub use file::JsonFileStore;
pub use types::{StoreState, StoredEvaluation};

use anyhow::Result;
use std::path::PathBuf;

use crate::evaluation::EvaluationRecord;

/// Get the default store file path (~/.config/rubric-grader/evaluations.json)
pub fn get_store_path() -> PathBuf {
    crate::config::get_config_dir().join("evaluations.json")
}

/// Persistence for completed evaluations, keyed by record id.
///
/// Records are append-only: `save` rejects an id that already exists, and
/// `update` replaces a whole record.
pub trait EvaluationStore {
    /// Persist a new record and return its id
    fn save(&mut self, record: &EvaluationRecord) -> Result<String>;

    /// All saved evaluations, newest first
    fn list_all(&self) -> Result<Vec<StoredEvaluation>>;

    fn get(&self, id: &str) -> Result<Option<StoredEvaluation>>;

    fn update(&mut self, record: &EvaluationRecord) -> Result<()>;

    /// Returns true if the record existed
    fn delete(&mut self, id: &str) -> Result<bool>;

    /// Returns the number of records removed
    fn delete_all(&mut self) -> Result<usize>;

    /// Saved evaluations for one student (exact name match), newest first
    fn list_by_student(&self, student_name: &str) -> Result<Vec<StoredEvaluation>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|e| e.record.student_name() == student_name)
            .collect())
    }
}
