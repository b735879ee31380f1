use async_trait::async_trait;
use callassist_common::Result;
use sha2::{Digest, Sha256};

use crate::embedder::Embedder;
use crate::similarity::l2_normalize;

/// Feature hashed when the text has no tokens at all
const EMPTY_FEATURE: &str = "<empty>";

/// Deterministic model-free embedder
///
/// Hashes lowercase unigram and bigram features into `dimension` signed
/// buckets and normalizes the result. Identical texts always map to the
/// same vector and lexical overlap drives similarity, which is enough to
/// serve the dataset without an embedding server.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model_name: String,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model_name: format!("hashing-{}", dimension),
        }
    }

    /// Embed synchronously
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return vector;
        }

        let features = features(text);
        for feature in &features {
            let digest = Sha256::digest(feature.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        l2_normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Lowercase alphanumeric tokens
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn features(text: &str) -> Vec<String> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return vec![EMPTY_FEATURE.to_string()];
    }

    let mut features: Vec<String> = tokens.iter().map(|t| format!("w:{}", t)).collect();
    features.extend(tokens.windows(2).map(|pair| format!("b:{} {}", pair[0], pair[1])));
    features
}
