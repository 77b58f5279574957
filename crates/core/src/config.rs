use crate::chunking::ChunkingConfig;
use crate::providers::{EMBEDDING_PROVIDERS, TRANSLATION_PROVIDERS};
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub supabase: StoreConfig,
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    pub key: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_search_function")]
    pub search_function: String,
}

fn default_table() -> String {
    "embeddings".to_string()
}

fn default_search_function() -> String {
    "search_embeddings".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub dimensions: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            model: String::new(),
            api_key: String::new(),
            api_base: None,
            dimensions: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "default_translation_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default = "default_target_language")]
    pub target_language: String,
}

fn default_translation_provider() -> String {
    "none".to_string()
}

fn default_target_language() -> String {
    "English".to_string()
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: default_translation_provider(),
            model: String::new(),
            api_key: String::new(),
            api_base: None,
            target_language: default_target_language(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SearchSettings {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    // Percentage in `[0, 100]`.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
}

fn default_limit() -> usize {
    5
}

fn default_min_similarity() -> f64 {
    30.0
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            min_similarity: default_min_similarity(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub obsidian: Option<SourceRoot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRoot {
    pub path: PathBuf,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.supabase.url)?;
        if self.supabase.key.trim().is_empty() {
            return Err(ConfigError::Invalid("supabase.key must be set".to_string()));
        }

        if !EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(ConfigError::UnknownProvider {
                capability: "embedding",
                name: self.embedding.provider.clone(),
            });
        }
        if self.embedding.provider != "local" && self.embedding.model.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "embedding.model must be set when provider is '{}'",
                self.embedding.provider
            )));
        }

        if !TRANSLATION_PROVIDERS.contains(&self.translation.provider.as_str()) {
            return Err(ConfigError::UnknownProvider {
                capability: "translation",
                name: self.translation.provider.clone(),
            });
        }

        if self.search.default_limit == 0 {
            return Err(ConfigError::Invalid(
                "search.default_limit must be >= 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.search.min_similarity) {
            return Err(ConfigError::Invalid(
                "search.min_similarity must be in [0, 100]".to_string(),
            ));
        }

        self.chunking
            .validate()
            .map_err(|error| ConfigError::Invalid(error.to_string()))
    }

    pub fn notes_root(&self) -> Option<PathBuf> {
        self.sources
            .obsidian
            .as_ref()
            .map(|root| expand_home(&root.path))
    }
}

pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}
