use callassist_common::{write_atomic, AssistError, Result};
use std::path::Path;
use tracing::info;

use crate::types::Record;

/// Ordered, immutable collection of records
///
/// Position is the join key to the vector index, so there is no way to
/// insert, remove or reorder records once a store exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Load a source dataset (JSON array of records)
    ///
    /// A missing, unreadable or empty dataset is an error: an empty knowledge
    /// base is a configuration problem, not something to serve.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AssistError::dataset(format!(
                "Dataset not found: {} (run generate-dataset first)",
                path.display()
            )));
        }

        let data = std::fs::read_to_string(path).map_err(|e| {
            AssistError::dataset(format!("Failed to read dataset {}: {}", path.display(), e))
        })?;
        let records: Vec<Record> = serde_json::from_str(&data).map_err(|e| {
            AssistError::dataset(format!("Malformed dataset {}: {}", path.display(), e))
        })?;

        if records.is_empty() {
            return Err(AssistError::dataset(format!(
                "Dataset is empty: {}",
                path.display()
            )));
        }

        info!("Loaded {} records from {}", records.len(), path.display());
        Ok(Self { records })
    }

    /// Save as a pretty-printed JSON array (atomic)
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.records)?;
        write_atomic(path, data.as_bytes())?;
        Ok(())
    }

    pub fn get(&self, position: usize) -> Option<&Record> {
        self.records.get(position)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Texts to embed, in store order
    pub fn inputs(&self) -> Vec<String> {
        self.records.iter().map(|r| r.input.clone()).collect()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl From<Vec<Record>> for RecordStore {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
