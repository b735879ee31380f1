use callassist_common::{AppConfig, AssistError, Result};
use callassist_knowledge::RecordStore;
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info};

use crate::artifacts::ArtifactStore;
use crate::embedder::Embedder;
use crate::index::FlatIndex;
use crate::types::IndexManifest;

const DEFAULT_BATCH_SIZE: usize = 32;

/// Index, record store and manifest of one build
#[derive(Debug, Clone)]
pub struct BuiltIndex {
    pub manifest: IndexManifest,
    pub index: FlatIndex,
    pub records: RecordStore,
}

/// Offline index construction
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    show_progress: bool,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
            show_progress: false,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Embed every record's input (batched, order-preserving) and index it
    pub async fn build(&self, records: RecordStore) -> Result<BuiltIndex> {
        if records.is_empty() {
            return Err(AssistError::dataset("Cannot build an index from an empty dataset"));
        }

        let dimension = self.embedder.dimension();
        let inputs = records.inputs();
        info!(
            "Embedding {} records with {} (batch size {})",
            inputs.len(),
            self.embedder.model_name(),
            self.batch_size
        );

        let pb = self.progress_bar(inputs.len() as u64)?;
        let mut vectors = Vec::with_capacity(inputs.len());

        for (i, batch) in inputs.chunks(self.batch_size).enumerate() {
            debug!("Embedding batch {} ({} texts)", i + 1, batch.len());
            let embeddings = self.embedder.embed_batch(batch).await?;
            if embeddings.len() != batch.len() {
                return Err(AssistError::embedding(format!(
                    "Embedder returned {} vectors for {} texts",
                    embeddings.len(),
                    batch.len()
                )));
            }
            vectors.extend(embeddings);
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();

        let build_id = build_id(self.embedder.model_name(), &records, &vectors)?;
        let index = FlatIndex::build(vectors, dimension)?;

        let manifest = IndexManifest {
            build_id,
            embedding_model: self.embedder.model_name().to_string(),
            dimension,
            count: index.len(),
            created_at: chrono::Utc::now(),
        };

        info!("Built index {} with {} vectors", manifest.build_id, manifest.count);
        Ok(BuiltIndex {
            manifest,
            index,
            records,
        })
    }

    fn progress_bar(&self, len: u64) -> Result<ProgressBar> {
        if !self.show_progress {
            return Ok(ProgressBar::hidden());
        }

        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({eta})")
                .map_err(|e| AssistError::internal(format!("Invalid progress template: {}", e)))?
                .progress_chars("#>-"),
        );
        Ok(pb)
    }
}

/// First 16 hex chars of SHA-256 over model name, records and vector bytes
fn build_id(model: &str, records: &RecordStore, vectors: &[Vec<f32>]) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update(serde_json::to_vec(records.records())?);
    for vector in vectors {
        for value in vector {
            hasher.update(value.to_le_bytes());
        }
    }
    let digest = hex::encode(hasher.finalize());
    Ok(digest[..16].to_string())
}

/// Offline build step: dataset file in, published artifact pair out
///
/// Holds the build lock for the whole run. Nothing is written unless the
/// dataset loads, is non-empty and embeds cleanly.
pub async fn build_index(
    config: &AppConfig,
    embedder: Arc<dyn Embedder>,
    show_progress: bool,
) -> Result<IndexManifest> {
    let artifacts = ArtifactStore::new(&config.index_dir);
    let _lock = artifacts.lock()?;

    let records = RecordStore::load(&config.dataset_path)?;
    let built = IndexBuilder::new(embedder)
        .with_batch_size(config.embed_batch_size)
        .with_progress(show_progress)
        .build(records)
        .await?;

    artifacts.save(&built)?;
    Ok(built.manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashingEmbedder;
    use async_trait::async_trait;
    use callassist_knowledge::{generate_bfsi_dataset, Record};

    /// Drops the last vector of every batch
    struct LossyEmbedder(HashingEmbedder);

    #[async_trait]
    impl Embedder for LossyEmbedder {
        fn model_name(&self) -> &str {
            "lossy"
        }

        fn dimension(&self) -> usize {
            self.0.dimension()
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.0.embed(text).await
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut vectors = self.0.embed_batch(texts).await?;
            vectors.pop();
            Ok(vectors)
        }
    }

    fn test_config(root: &std::path::Path) -> AppConfig {
        AppConfig {
            data_dir: root.join("data"),
            dataset_path: root.join("data").join("bfsi_dataset.json"),
            index_dir: root.join("models"),
            embed_batch_size: 7,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn test_build_preserves_record_order() {
        let embedder = Arc::new(HashingEmbedder::new(384));
        let records = generate_bfsi_dataset();
        let built = IndexBuilder::new(embedder.clone())
            .with_batch_size(16)
            .build(records.clone())
            .await
            .unwrap();

        assert_eq!(built.index.len(), records.len());
        assert_eq!(built.manifest.count, records.len());
        assert_eq!(built.manifest.embedding_model, "hashing-384");

        // Row i is the embedding of record i
        for position in [0, 15, 16, 159] {
            let expected = embedder.embed_text(&records.get(position).unwrap().input);
            let row = built.index.vector(position).unwrap().to_vec();
            for (a, b) in row.iter().zip(&expected) {
                assert!((a - b).abs() < 1e-6);
            }
        }
    }

    #[tokio::test]
    async fn test_build_id_is_deterministic() {
        let embedder = Arc::new(HashingEmbedder::new(64));
        let records = generate_bfsi_dataset();

        let first = IndexBuilder::new(embedder.clone()).build(records.clone()).await.unwrap();
        let second = IndexBuilder::new(embedder.clone())
            .with_batch_size(5)
            .build(records)
            .await
            .unwrap();
        assert_eq!(first.manifest.build_id, second.manifest.build_id);
        assert_eq!(first.manifest.build_id.len(), 16);

        let other = IndexBuilder::new(embedder)
            .build(RecordStore::new(vec![Record::new("a", "b", "c")]))
            .await
            .unwrap();
        assert_ne!(first.manifest.build_id, other.manifest.build_id);
    }

    #[tokio::test]
    async fn test_empty_records_rejected() {
        let builder = IndexBuilder::new(Arc::new(HashingEmbedder::new(8)));
        let err = builder.build(RecordStore::default()).await.unwrap_err();
        assert!(matches!(err, AssistError::Dataset(_)));
    }

    #[tokio::test]
    async fn test_short_batch_rejected() {
        let builder = IndexBuilder::new(Arc::new(LossyEmbedder(HashingEmbedder::new(8))));
        let err = builder.build(generate_bfsi_dataset()).await.unwrap_err();
        assert!(matches!(err, AssistError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_build_index_publishes_artifacts() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());
        generate_bfsi_dataset().save(&config.dataset_path).unwrap();

        let manifest = build_index(&config, Arc::new(HashingEmbedder::new(128)), false)
            .await
            .unwrap();

        let loaded = ArtifactStore::new(&config.index_dir).load().unwrap();
        assert_eq!(loaded.manifest, manifest);
        assert_eq!(loaded.records.len(), loaded.index.len());
        assert!(!config.index_dir.join(crate::artifacts::LOCK_FILE).exists());
    }

    #[tokio::test]
    async fn test_missing_dataset_writes_nothing() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());

        let err = build_index(&config, Arc::new(HashingEmbedder::new(16)), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::Dataset(_)));

        let artifacts = ArtifactStore::new(&config.index_dir);
        assert!(!artifacts.exists());
        assert!(!config.index_dir.join("builds").exists());
    }

    #[tokio::test]
    async fn test_empty_dataset_writes_nothing() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());
        std::fs::create_dir_all(&config.data_dir).unwrap();
        std::fs::write(&config.dataset_path, "[]").unwrap();

        let err = build_index(&config, Arc::new(HashingEmbedder::new(16)), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::Dataset(_)));
        assert!(!ArtifactStore::new(&config.index_dir).exists());
    }
}
