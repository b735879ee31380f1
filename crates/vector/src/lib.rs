//! Call assistant retrieval tier
//!
//! Embedders, the flat nearest-neighbor index, paired artifact persistence,
//! the offline index build and the runtime retrieval engine.

pub mod artifacts;
pub mod builder;
pub mod embedder;
pub mod engine;
pub mod hashing;
pub mod index;
pub mod similarity;
pub mod types;

pub use artifacts::{ArtifactStore, BuildLock};
pub use builder::{build_index, BuiltIndex, IndexBuilder};
pub use embedder::{embedder_from_config, Embedder, OllamaEmbedder};
pub use engine::{RetrievalEngine, Retriever};
pub use hashing::HashingEmbedder;
pub use index::FlatIndex;
pub use similarity::{cosine_similarity, distance_to_similarity, l2_normalize};
pub use types::{IndexManifest, Neighbor, Retrieval};
