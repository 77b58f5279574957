use super::{finish_translation, read_json, text_at, vector_at, TranslationPrompt};
use crate::config::{EmbeddingConfig, TranslationConfig};
use crate::traits::{Embedder, Translator};
use crate::{InputKind, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "openai";

pub struct OpenAiEmbedder {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| OPENAI_API_BASE.to_string()),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str, _kind: InputKind) -> Result<Vec<f32>, ProviderError> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "input": text,
            }))
            .send()
            .await?;

        let parsed = read_json(response, PROVIDER).await?;
        vector_at(&parsed, "/data/0/embedding", PROVIDER)
    }
}

pub struct OpenAiTranslator {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiTranslator {
    pub fn new(config: &TranslationConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| OPENAI_API_BASE.to_string()),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        kind: InputKind,
    ) -> Result<String, ProviderError> {
        let prompt = TranslationPrompt::new(text, target_language, kind);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "max_tokens": prompt.max_tokens,
                "temperature": prompt.temperature(),
                "messages": [{ "role": "user", "content": prompt.content }],
            }))
            .send()
            .await?;

        let parsed = read_json(response, PROVIDER).await?;
        let translated = text_at(&parsed, "/choices/0/message/content", PROVIDER)?;
        Ok(finish_translation(&translated, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_embedding_and_completion_shapes() {
        let embedding = json!({ "data": [{ "index": 0, "embedding": [0.25, -1.0] }] });
        assert_eq!(
            vector_at(&embedding, "/data/0/embedding", PROVIDER).unwrap(),
            vec![0.25, -1.0]
        );

        let completion = json!({ "choices": [{ "message": { "content": " project planning " } }] });
        assert_eq!(
            text_at(&completion, "/choices/0/message/content", PROVIDER).unwrap(),
            " project planning "
        );
    }

    #[test]
    fn api_base_defaults_to_public_endpoint() {
        let embedder = OpenAiEmbedder::new(&EmbeddingConfig {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            ..EmbeddingConfig::default()
        });
        assert_eq!(embedder.api_base, OPENAI_API_BASE);
        assert_eq!(embedder.model_name(), "text-embedding-3-small");
    }
}
