//! Paired persistence of the vector index and the record store
//!
//! Layout under the index directory:
//!
//! ```text
//! CURRENT                        manifest of the live build
//! .build.lock                    held while a build runs
//! builds/<build_id>/index.json
//! builds/<build_id>/records.json
//! ```
//!
//! A build is written to a temp directory, renamed into place and only then
//! published by atomically replacing `CURRENT`, so a reader never sees half
//! a build or an index and record store from two different builds.

use callassist_common::{write_atomic, AssistError, Result};
use callassist_knowledge::{Record, RecordStore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::builder::BuiltIndex;
use crate::index::FlatIndex;
use crate::types::IndexManifest;

pub const MANIFEST_FILE: &str = "CURRENT";
pub const LOCK_FILE: &str = ".build.lock";
const BUILDS_DIR: &str = "builds";
const INDEX_FILE: &str = "index.json";
const RECORDS_FILE: &str = "records.json";
const TMP_PREFIX: &str = ".tmp-";

/// Serialized vector index
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    build_id: String,
    embedding_model: String,
    dimension: usize,
    count: usize,
    /// Row-major, `count * dimension` values
    vectors: Vec<f32>,
}

/// Serialized record store
#[derive(Debug, Serialize, Deserialize)]
struct RecordsFile {
    build_id: String,
    records: Vec<Record>,
}

/// Index directory handle
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    fn builds_dir(&self) -> PathBuf {
        self.root.join(BUILDS_DIR)
    }

    pub fn build_dir(&self, build_id: &str) -> PathBuf {
        self.builds_dir().join(build_id)
    }

    /// Whether a build has been published
    pub fn exists(&self) -> bool {
        self.manifest_path().exists()
    }

    /// Take the exclusive build lock
    pub fn lock(&self) -> Result<BuildLock> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(LOCK_FILE);

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    AssistError::index(format!(
                        "Another index build is running (remove {} if it crashed)",
                        path.display()
                    ))
                } else {
                    AssistError::Io(e)
                }
            })?;
        writeln!(file, "{}", std::process::id())?;

        Ok(BuildLock { path })
    }

    /// Manifest of the live build
    pub fn read_manifest(&self) -> Result<IndexManifest> {
        let path = self.manifest_path();
        if !path.exists() {
            return Err(AssistError::not_found(format!(
                "No index published in {} (run build-index first)",
                self.root.display()
            )));
        }
        read_json(&path)
    }

    /// Persist a build and publish it as the live one
    pub fn save(&self, built: &BuiltIndex) -> Result<()> {
        let manifest = &built.manifest;
        let current = self.read_manifest().ok().map(|m| m.build_id);
        let republish = current.as_deref() == Some(manifest.build_id.as_str());

        let final_dir = self.build_dir(&manifest.build_id);
        if final_dir.exists() {
            debug!("Build {} already on disk, republishing", manifest.build_id);
        } else {
            self.write_build_dir(built, &final_dir)?;
        }

        let data = serde_json::to_vec_pretty(manifest)?;
        write_atomic(&self.manifest_path(), &data)?;
        info!(
            "Published build {} ({} records, dimension {})",
            manifest.build_id, manifest.count, manifest.dimension
        );

        // The live build is unchanged, so whatever preceded it stays too
        if republish {
            return Ok(());
        }

        let mut keep = vec![manifest.build_id.as_str()];
        if let Some(previous) = current.as_deref() {
            keep.push(previous);
        }
        self.prune(&keep);

        Ok(())
    }

    fn write_build_dir(&self, built: &BuiltIndex, final_dir: &Path) -> Result<()> {
        let manifest = &built.manifest;
        let tmp_dir = self
            .builds_dir()
            .join(format!("{}{}", TMP_PREFIX, manifest.build_id));
        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir)?;
        }
        fs::create_dir_all(&tmp_dir)?;

        let result = (|| -> Result<()> {
            let index_file = IndexFile {
                build_id: manifest.build_id.clone(),
                embedding_model: manifest.embedding_model.clone(),
                dimension: built.index.dimension(),
                count: built.index.len(),
                vectors: built.index.to_raw(),
            };
            write_json(&tmp_dir.join(INDEX_FILE), &index_file)?;

            let records_file = RecordsFile {
                build_id: manifest.build_id.clone(),
                records: built.records.records().to_vec(),
            };
            write_json(&tmp_dir.join(RECORDS_FILE), &records_file)?;

            fs::rename(&tmp_dir, final_dir)?;
            Ok(())
        })();

        if result.is_err() {
            if let Err(e) = fs::remove_dir_all(&tmp_dir) {
                warn!("Failed to clean up {}: {}", tmp_dir.display(), e);
            }
        }
        result
    }

    /// Load the live build
    ///
    /// Missing or unreadable files come back as ordinary errors; any
    /// disagreement between the manifest, the index and the record store
    /// is a consistency error.
    pub fn load(&self) -> Result<BuiltIndex> {
        let manifest = self.read_manifest()?;
        let dir = self.build_dir(&manifest.build_id);

        let index_file: IndexFile = read_json(&dir.join(INDEX_FILE))?;
        let records_file: RecordsFile = read_json(&dir.join(RECORDS_FILE))?;

        if index_file.build_id != manifest.build_id || records_file.build_id != manifest.build_id {
            return Err(AssistError::consistency(format!(
                "Build id mismatch: manifest {}, index {}, records {}",
                manifest.build_id, index_file.build_id, records_file.build_id
            )));
        }

        if index_file.count != manifest.count || records_file.records.len() != manifest.count {
            return Err(AssistError::consistency(format!(
                "Record count mismatch: manifest {}, index {}, records {}",
                manifest.count,
                index_file.count,
                records_file.records.len()
            )));
        }

        if index_file.dimension != manifest.dimension {
            return Err(AssistError::DimensionMismatch {
                expected: manifest.dimension,
                actual: index_file.dimension,
            });
        }

        if index_file.embedding_model != manifest.embedding_model {
            return Err(AssistError::consistency(format!(
                "Embedding model mismatch: manifest {}, index {}",
                manifest.embedding_model, index_file.embedding_model
            )));
        }

        let index = FlatIndex::from_raw(index_file.dimension, index_file.count, index_file.vectors)?;
        let records = RecordStore::new(records_file.records);

        info!(
            "Loaded build {} from {} ({} records)",
            manifest.build_id,
            self.root.display(),
            records.len()
        );

        Ok(BuiltIndex {
            manifest,
            index,
            records,
        })
    }

    /// Remove builds not listed in `keep`, plus stale temp directories
    fn prune(&self, keep: &[&str]) {
        let entries = match fs::read_dir(self.builds_dir()) {
            Ok(entries) => entries,
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if keep.contains(&name.as_str()) {
                continue;
            }
            match fs::remove_dir_all(entry.path()) {
                Ok(()) => debug!("Pruned build {}", name),
                Err(e) => warn!("Failed to prune build {}: {}", name, e),
            }
        }
    }
}

/// Held for the duration of an index build; released on drop
#[derive(Debug)]
pub struct BuildLock {
    path: PathBuf,
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to release build lock {}: {}", self.path.display(), e);
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec(value)?;
    let mut file = fs::File::create(path)?;
    file.write_all(&data)?;
    file.sync_all()?;
    Ok(())
}
