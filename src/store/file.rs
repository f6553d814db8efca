use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::Utc;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use super::types::StoreState;
use super::{EvaluationStore, StoredEvaluation};
use crate::evaluation::EvaluationRecord;

/// Evaluation store backed by a single JSON document.
///
/// Every operation reads the file, applies the change and writes it back
/// atomically, so a failed write leaves the previous contents intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load store state from disk
    ///
    /// If the file doesn't exist, returns a new empty state.
    /// If the file exists but has an unsupported version, returns an error.
    pub fn load(&self) -> Result<StoreState> {
        if !self.path.exists() {
            return Ok(StoreState::new());
        }

        let file = File::open(&self.path).with_context(|| {
            format!("Failed to open evaluation store at {}", self.path.display())
        })?;

        let state: StoreState =
            serde_json::from_reader(file).context("Failed to load evaluation store")?;

        if state.version != 1 {
            anyhow::bail!("Unsupported evaluation store version: {}", state.version);
        }

        Ok(state)
    }

    /// Save store state to disk atomically, creating parent directories
    pub fn persist(&self, state: &StoreState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory {}", parent.display())
                })?;
            }
        }

        let mut file = AtomicWriteFile::open(&self.path).with_context(|| {
            format!("Failed to open atomic write file at {}", self.path.display())
        })?;

        serde_json::to_writer_pretty(&mut file, state)
            .context("Failed to serialize evaluation store")?;

        file.commit().context("Failed to save evaluation store")?;

        Ok(())
    }
}

impl EvaluationStore for JsonFileStore {
    fn save(&mut self, record: &EvaluationRecord) -> Result<String> {
        let mut state = self.load()?;
        if !state.insert(record.clone(), Utc::now()) {
            anyhow::bail!("Evaluation {} is already saved", record.id());
        }
        self.persist(&state)?;
        tracing::debug!("Saved evaluation {} to {}", record.id(), self.path.display());
        Ok(record.id().to_string())
    }

    fn list_all(&self) -> Result<Vec<StoredEvaluation>> {
        Ok(self.load()?.newest_first())
    }

    fn get(&self, id: &str) -> Result<Option<StoredEvaluation>> {
        Ok(self.load()?.find(id).cloned())
    }

    fn update(&mut self, record: &EvaluationRecord) -> Result<()> {
        let mut state = self.load()?;
        if !state.replace(record.clone(), Utc::now()) {
            anyhow::bail!("Evaluation {} not found", record.id());
        }
        self.persist(&state)
    }

    fn delete(&mut self, id: &str) -> Result<bool> {
        let mut state = self.load()?;
        let removed = state.remove(id);
        if removed {
            self.persist(&state)?;
        }
        Ok(removed)
    }

    fn delete_all(&mut self) -> Result<usize> {
        let mut state = self.load()?;
        let count = state.evaluations.len();
        state.evaluations.clear();
        self.persist(&state)?;
        Ok(count)
    }
}
