use super::{read_json, vector_at};
use crate::config::EmbeddingConfig;
use crate::traits::Embedder;
use crate::{InputKind, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

pub const COHERE_API_BASE: &str = "https://api.cohere.ai/v1";

const PROVIDER: &str = "cohere";

pub struct CohereEmbedder {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl CohereEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| COHERE_API_BASE.to_string()),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

fn input_type(kind: InputKind) -> &'static str {
    match kind {
        InputKind::Document => "search_document",
        InputKind::Query => "search_query",
    }
}

#[async_trait]
impl Embedder for CohereEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str, kind: InputKind) -> Result<Vec<f32>, ProviderError> {
        let response = self
            .client
            .post(format!("{}/embed", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "texts": [text],
                "model": self.model,
                "input_type": input_type(kind),
            }))
            .send()
            .await?;

        let parsed = read_json(response, PROVIDER).await?;
        vector_at(&parsed, "/embeddings/0", PROVIDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_and_queries_use_distinct_input_types() {
        assert_eq!(input_type(InputKind::Document), "search_document");
        assert_eq!(input_type(InputKind::Query), "search_query");
    }

    #[test]
    fn reads_first_embedding() {
        let parsed = json!({ "embeddings": [[1.0, 2.0, 3.0]] });
        assert_eq!(
            vector_at(&parsed, "/embeddings/0", PROVIDER).unwrap(),
            vec![1.0, 2.0, 3.0]
        );
    }
}
