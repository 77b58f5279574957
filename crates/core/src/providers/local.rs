use crate::traits::Embedder;
use crate::{InputKind, ProviderError};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 128;

/// Offline embedder for `provider = "local"`: whole words and per-word
/// character trigrams, signed-hashed into `dimensions` buckets.
#[derive(Debug, Clone, Copy)]
pub struct FeatureHashEmbedder {
    pub dimensions: usize,
}

impl Default for FeatureHashEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

fn features(text: &str) -> Vec<String> {
    let mut features = Vec::new();
    for word in text.split_whitespace().map(str::to_lowercase) {
        let padded: Vec<char> = format!(" {word} ").chars().collect();
        features.extend(padded.windows(3).map(|gram| gram.iter().collect::<String>()));
        features.push(word);
    }
    features
}

impl FeatureHashEmbedder {
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let dimensions = self.dimensions.max(1);
        let mut vector = vec![0f32; dimensions];

        for feature in features(text) {
            let digest = Sha256::digest(feature.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|value| *value /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for FeatureHashEmbedder {
    fn model_name(&self) -> &str {
        "feature-hash"
    }

    async fn embed(&self, text: &str, _kind: InputKind) -> Result<Vec<f32>, ProviderError> {
        Ok(self.vector(text))
    }
}
