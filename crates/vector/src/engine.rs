use callassist_common::{AppConfig, AssistError, Result};
use callassist_knowledge::RecordStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::artifacts::ArtifactStore;
use crate::builder::BuiltIndex;
use crate::embedder::{embedder_from_config, Embedder};
use crate::index::FlatIndex;
use crate::similarity::distance_to_similarity;
use crate::types::{IndexManifest, Retrieval};

/// Embedder + index + record store, validated against each other
///
/// Nothing here is mutable after construction, so one engine can serve any
/// number of concurrent queries through a shared reference.
pub struct RetrievalEngine {
    embedder: Arc<dyn Embedder>,
    index: FlatIndex,
    records: RecordStore,
    manifest: IndexManifest,
    query_timeout: Duration,
}

impl RetrievalEngine {
    /// Check the pieces fit together
    ///
    /// Record count, dimension and embedding model must all agree; any
    /// disagreement is a consistency error and the engine is not created.
    pub fn new(embedder: Arc<dyn Embedder>, built: BuiltIndex, query_timeout: Duration) -> Result<Self> {
        let BuiltIndex {
            manifest,
            index,
            records,
        } = built;

        if records.len() != index.len() {
            return Err(AssistError::consistency(format!(
                "Record store has {} records but the index has {} vectors",
                records.len(),
                index.len()
            )));
        }

        if embedder.dimension() != index.dimension() {
            return Err(AssistError::DimensionMismatch {
                expected: index.dimension(),
                actual: embedder.dimension(),
            });
        }

        if embedder.model_name() != manifest.embedding_model {
            return Err(AssistError::consistency(format!(
                "Index was built with '{}' but the embedder is '{}'",
                manifest.embedding_model,
                embedder.model_name()
            )));
        }

        Ok(Self {
            embedder,
            index,
            records,
            manifest,
            query_timeout,
        })
    }

    /// Nearest record to `query` and its similarity
    ///
    /// Every query gets an answer: empty strings are embedded like any other
    /// text, and an embedding failure or timeout yields the no-match result.
    pub async fn retrieve(&self, query: &str) -> Retrieval<'_> {
        let query_vector = match tokio::time::timeout(self.query_timeout, self.embedder.embed(query)).await {
            Ok(Ok(vector)) => vector,
            Ok(Err(e)) => {
                warn!("Query embedding failed, treating as no match: {}", e);
                return Retrieval::none();
            }
            Err(_) => {
                warn!("Query embedding timed out after {:?}, treating as no match", self.query_timeout);
                return Retrieval::none();
            }
        };

        let neighbor = match self.index.nearest(&query_vector) {
            Ok(Some(neighbor)) => neighbor,
            Ok(None) => {
                debug!("Index is empty, no match");
                return Retrieval::none();
            }
            Err(e) => {
                error!("Index search failed, treating as no match: {}", e);
                return Retrieval::none();
            }
        };

        let Some(record) = self.records.get(neighbor.position) else {
            return Retrieval::none();
        };

        let similarity = distance_to_similarity(neighbor.distance);
        debug!(
            "Nearest record {} (distance {:.4}, similarity {:.4})",
            neighbor.position, neighbor.distance, similarity
        );

        Retrieval {
            record: Some(record),
            position: Some(neighbor.position),
            similarity,
        }
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Retrieval tier state, settled once at startup
pub enum Retriever {
    Ready(RetrievalEngine),
    /// Artifacts or embedder unavailable; every query gets no match
    NotReady { reason: String },
}

impl Retriever {
    /// Construct the embedder from config and load the published artifacts
    ///
    /// Returns `Err` only for consistency failures; anything missing or
    /// unreachable gives `NotReady`.
    pub async fn load(config: &AppConfig) -> Result<Self> {
        let artifacts = ArtifactStore::new(&config.index_dir);
        let embedder = match embedder_from_config(config).await {
            Ok(embedder) => embedder,
            Err(e) => {
                warn!("Retrieval disabled, embedder unavailable: {}", e);
                return Ok(Self::NotReady {
                    reason: format!("embedder unavailable: {}", e),
                });
            }
        };

        Self::from_parts(embedder, &artifacts, config.request_timeout())
    }

    /// Load artifacts for an already constructed embedder
    pub fn from_parts(
        embedder: Arc<dyn Embedder>,
        artifacts: &ArtifactStore,
        query_timeout: Duration,
    ) -> Result<Self> {
        let built = match artifacts.load() {
            Ok(built) => built,
            Err(e) if e.is_consistency() => return Err(e),
            Err(e) => {
                warn!("Retrieval disabled, index artifacts unavailable: {}", e);
                return Ok(Self::NotReady {
                    reason: format!("index artifacts unavailable: {}", e),
                });
            }
        };

        let engine = RetrievalEngine::new(embedder, built, query_timeout)?;
        info!(
            "Retrieval ready: {} records, model {}",
            engine.len(),
            engine.manifest().embedding_model
        );
        Ok(Self::Ready(engine))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn engine(&self) -> Option<&RetrievalEngine> {
        match self {
            Self::Ready(engine) => Some(engine),
            Self::NotReady { .. } => None,
        }
    }

    /// Retrieve through the engine, or no match when not ready
    pub async fn retrieve(&self, query: &str) -> Retrieval<'_> {
        match self {
            Self::Ready(engine) => engine.retrieve(query).await,
            Self::NotReady { .. } => Retrieval::none(),
        }
    }
}
