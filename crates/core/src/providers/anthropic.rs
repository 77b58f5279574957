use super::{finish_translation, read_json, text_at, TranslationPrompt};
use crate::config::TranslationConfig;
use crate::traits::Translator;
use crate::{InputKind, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const PROVIDER: &str = "anthropic";

pub struct AnthropicTranslator {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl AnthropicTranslator {
    pub fn new(config: &TranslationConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| ANTHROPIC_API_BASE.to_string()),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl Translator for AnthropicTranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        kind: InputKind,
    ) -> Result<String, ProviderError> {
        let prompt = TranslationPrompt::new(text, target_language, kind);
        let response = self
            .client
            .post(format!("{}/messages", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&json!({
                "model": self.model,
                "max_tokens": prompt.max_tokens,
                "temperature": prompt.temperature(),
                "messages": [{ "role": "user", "content": prompt.content }],
            }))
            .send()
            .await?;

        let parsed = read_json(response, PROVIDER).await?;
        let translated = text_at(&parsed, "/content/0/text", PROVIDER)?;
        Ok(finish_translation(&translated, kind))
    }
}
