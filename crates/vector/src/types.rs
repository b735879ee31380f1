use callassist_knowledge::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One search hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position in the index (and in the record store)
    pub position: usize,

    /// Squared Euclidean distance to the query
    pub distance: f32,
}

/// Description of one build, stored in `CURRENT`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Content hash shared by the index and record store files
    pub build_id: String,

    /// Embedding model the vectors came from
    pub embedding_model: String,

    /// Vector dimension
    pub dimension: usize,

    /// Number of records (and vectors)
    pub count: usize,

    /// When the build finished
    pub created_at: DateTime<Utc>,
}

/// Result of a retrieval call
///
/// `record` is `None` when the engine is not ready, the index is empty or the
/// query could not be embedded; `similarity` is then 0.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retrieval<'a> {
    pub record: Option<&'a Record>,
    pub position: Option<usize>,
    pub similarity: f32,
}

impl<'a> Retrieval<'a> {
    /// The "no match" result
    pub fn none() -> Self {
        Self {
            record: None,
            position: None,
            similarity: 0.0,
        }
    }

    pub fn is_match(&self) -> bool {
        self.record.is_some()
    }
}
