pub mod anthropic;
pub mod cohere;
pub mod local;
pub mod openai;

pub use anthropic::AnthropicTranslator;
pub use cohere::CohereEmbedder;
pub use local::{FeatureHashEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use openai::{OpenAiEmbedder, OpenAiTranslator};

use crate::config::{EmbeddingConfig, TranslationConfig};
use crate::traits::{Embedder, Translator};
use crate::{ConfigError, InputKind, ProviderError};
use async_trait::async_trait;
use reqwest::Response;
use serde_json::Value;
use tracing::warn;

pub const EMBEDDING_PROVIDERS: &[&str] = &["openai", "cohere", "local"];
pub const TRANSLATION_PROVIDERS: &[&str] = &["none", "openai", "anthropic"];

const TRANSLATION_TEMPERATURE: f64 = 0.3;

pub fn build_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>, ConfigError> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiEmbedder::new(config))),
        "cohere" => Ok(Box::new(CohereEmbedder::new(config))),
        "local" => Ok(Box::new(FeatureHashEmbedder {
            dimensions: config.dimensions.unwrap_or(DEFAULT_EMBEDDING_DIMENSIONS),
        })),
        other => Err(ConfigError::UnknownProvider {
            capability: "embedding",
            name: other.to_string(),
        }),
    }
}

pub fn build_translator(config: &TranslationConfig) -> Result<Box<dyn Translator>, ConfigError> {
    match config.provider.as_str() {
        "none" => Ok(Box::new(NoTranslation)),
        "openai" => Ok(Box::new(OpenAiTranslator::new(config))),
        "anthropic" => Ok(Box::new(AnthropicTranslator::new(config))),
        other => Err(ConfigError::UnknownProvider {
            capability: "translation",
            name: other.to_string(),
        }),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoTranslation;

#[async_trait]
impl Translator for NoTranslation {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn translate(
        &self,
        text: &str,
        _target_language: &str,
        _kind: InputKind,
    ) -> Result<String, ProviderError> {
        Ok(text.to_string())
    }
}

pub async fn translate_or_original(
    translator: &dyn Translator,
    text: &str,
    target_language: &str,
    kind: InputKind,
) -> String {
    if !translator.is_enabled() {
        return text.to_string();
    }

    match translator.translate(text, target_language, kind).await {
        Ok(translated) => translated,
        Err(error) => {
            warn!(error = %error, ?kind, "translation failed, keeping original text");
            text.to_string()
        }
    }
}

pub(crate) struct TranslationPrompt {
    pub content: String,
    pub max_tokens: u32,
}

impl TranslationPrompt {
    pub fn new(text: &str, target_language: &str, kind: InputKind) -> Self {
        match kind {
            InputKind::Document => Self {
                content: format!(
                    "You are a professional translator. Translate the following text to \
                     {target_language}. Preserve formatting, markdown, and technical terms. \
                     Keep it natural and accurate.\n\n{text}"
                ),
                max_tokens: 4096,
            },
            InputKind::Query => Self {
                content: format!(
                    "You are a search query translator. Translate the following search query \
                     to {target_language}. Keep it short and natural. Preserve technical \
                     terms.\n\nQuery: {text}"
                ),
                max_tokens: 100,
            },
        }
    }

    pub fn temperature(&self) -> f64 {
        TRANSLATION_TEMPERATURE
    }
}

pub(crate) fn finish_translation(text: &str, kind: InputKind) -> String {
    match kind {
        InputKind::Document => text.to_string(),
        InputKind::Query => text.trim().to_string(),
    }
}

pub(crate) async fn read_json(response: Response, provider: &str) -> Result<Value, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let details = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            provider: provider.to_string(),
            status: status.as_u16(),
            details,
        });
    }

    Ok(response.json().await?)
}

pub(crate) fn vector_at(json: &Value, pointer: &str, provider: &str) -> Result<Vec<f32>, ProviderError> {
    let values = json
        .pointer(pointer)
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::InvalidResponse {
            provider: provider.to_string(),
            details: format!("missing embedding array at {pointer}"),
        })?;

    values
        .iter()
        .map(|value| {
            value
                .as_f64()
                .map(|number| number as f32)
                .ok_or_else(|| ProviderError::InvalidResponse {
                    provider: provider.to_string(),
                    details: "embedding value must be numeric".to_string(),
                })
        })
        .collect()
}

pub(crate) fn text_at(json: &Value, pointer: &str, provider: &str) -> Result<String, ProviderError> {
    json.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ProviderError::InvalidResponse {
            provider: provider.to_string(),
            details: format!("missing text at {pointer}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct BrokenTranslator;

    #[async_trait]
    impl Translator for BrokenTranslator {
        async fn translate(
            &self,
            _text: &str,
            _target_language: &str,
            _kind: InputKind,
        ) -> Result<String, ProviderError> {
            Err(ProviderError::InvalidResponse {
                provider: "broken".to_string(),
                details: "offline".to_string(),
            })
        }
    }

    #[test]
    fn unknown_providers_fail_at_construction() {
        let embedding = EmbeddingConfig {
            provider: "word2vec".to_string(),
            ..EmbeddingConfig::default()
        };
        assert!(matches!(
            build_embedder(&embedding),
            Err(ConfigError::UnknownProvider { capability: "embedding", .. })
        ));

        let translation = TranslationConfig {
            provider: "babelfish".to_string(),
            ..TranslationConfig::default()
        };
        assert!(matches!(
            build_translator(&translation),
            Err(ConfigError::UnknownProvider { capability: "translation", .. })
        ));
    }

    #[test]
    fn registry_builds_known_providers() {
        for name in EMBEDDING_PROVIDERS {
            let config = EmbeddingConfig {
                provider: name.to_string(),
                model: "model".to_string(),
                ..EmbeddingConfig::default()
            };
            assert!(build_embedder(&config).is_ok(), "{name}");
        }
        for name in TRANSLATION_PROVIDERS {
            let config = TranslationConfig {
                provider: name.to_string(),
                ..TranslationConfig::default()
            };
            assert!(build_translator(&config).is_ok(), "{name}");
        }
    }

    #[tokio::test]
    async fn failed_translation_keeps_original_text() {
        let text = translate_or_original(&BrokenTranslator, "회의 메모", "English", InputKind::Document).await;
        assert_eq!(text, "회의 메모");
    }

    #[tokio::test]
    async fn disabled_translation_is_identity() {
        let text = translate_or_original(&NoTranslation, "  그대로  ", "English", InputKind::Query).await;
        assert_eq!(text, "  그대로  ");
    }

    #[test]
    fn prompts_differ_by_input_kind() {
        let document = TranslationPrompt::new("본문", "English", InputKind::Document);
        let query = TranslationPrompt::new("검색어", "English", InputKind::Query);

        assert_eq!(document.max_tokens, 4096);
        assert!(document.content.ends_with("\n\n본문"));
        assert_eq!(query.max_tokens, 100);
        assert!(query.content.ends_with("Query: 검색어"));
        assert_eq!(finish_translation(" hello \n", InputKind::Query), "hello");
        assert_eq!(finish_translation(" hello \n", InputKind::Document), " hello \n");
    }

    #[test]
    fn vectors_are_read_by_pointer() {
        let json = json!({ "data": [{ "embedding": [0.5, 1.5] }] });
        assert_eq!(vector_at(&json, "/data/0/embedding", "openai").unwrap(), vec![0.5, 1.5]);
        assert!(vector_at(&json, "/data/1/embedding", "openai").is_err());

        let bad = json!({ "data": [{ "embedding": ["x"] }] });
        assert!(vector_at(&bad, "/data/0/embedding", "openai").is_err());
    }
}
