use crate::{IngestError, InputKind, ProviderError, SearchError, StoreMatch, StoredChunk};
use async_trait::async_trait;

#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    async fn embed(&self, text: &str, kind: InputKind) -> Result<Vec<f32>, ProviderError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// `false` when the translator hands text back untouched.
    fn is_enabled(&self) -> bool {
        true
    }

    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        kind: InputKind,
    ) -> Result<String, ProviderError>;
}

#[async_trait]
pub trait VectorIndex {
    async fn insert(&self, embedding: &[f32], record: &StoredChunk) -> Result<(), SearchError>;

    /// `threshold` is a fraction in `[0, 1]`; results come back best first.
    async fn similarity_search(
        &self,
        query_vector: &[f32],
        threshold: f64,
        count: usize,
    ) -> Result<Vec<StoreMatch>, SearchError>;
}

pub trait TokenCodec: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, IngestError>;

    fn detokenize(&self, tokens: &[u32]) -> Result<String, IngestError>;
}
