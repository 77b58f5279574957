use crate::error::IngestError;
use crate::models::{Chunk, NoteMetadata};
use crate::traits::TokenCodec;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;
use tokenizers::Tokenizer;

/// cl100k-compatible tokenizer published on the Hugging Face hub.
pub const DEFAULT_TOKENIZER: &str = "Xenova/text-embedding-ada-002";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Hub identifier or path to a `tokenizer.json`.
    pub tokenizer: String,
    /// Notes with fewer whitespace-separated words are kept whole.
    pub small_document_words: usize,
    pub window_tokens: usize,
    pub overlap_tokens: usize,
    /// Windows shorter than this are dropped.
    pub min_chunk_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            tokenizer: DEFAULT_TOKENIZER.to_string(),
            small_document_words: 200,
            window_tokens: 512,
            overlap_tokens: 128,
            min_chunk_tokens: 100,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.window_tokens == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "window_tokens must be > 0".to_string(),
            ));
        }
        if self.overlap_tokens >= self.window_tokens {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap_tokens {} must be smaller than window_tokens {}",
                self.overlap_tokens, self.window_tokens
            )));
        }
        if self.min_chunk_tokens > self.window_tokens {
            return Err(IngestError::InvalidChunkConfig(format!(
                "min_chunk_tokens {} must not exceed window_tokens {}",
                self.min_chunk_tokens, self.window_tokens
            )));
        }
        Ok(())
    }

    pub fn stride(&self) -> usize {
        self.window_tokens - self.overlap_tokens
    }
}

pub fn load_tokenizer(identifier: &str) -> Result<Tokenizer, IngestError> {
    let path = Path::new(identifier);
    let loaded = if path.is_file() {
        Tokenizer::from_file(path)
    } else {
        Tokenizer::from_pretrained(identifier, None)
    };

    loaded.map_err(|error| IngestError::Tokenizer(error.to_string()))
}

impl TokenCodec for Tokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, IngestError> {
        let encoding = self
            .encode(text, false)
            .map_err(|error| IngestError::Tokenizer(error.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn detokenize(&self, tokens: &[u32]) -> Result<String, IngestError> {
        self.decode(tokens, true)
            .map_err(|error| IngestError::Tokenizer(error.to_string()))
    }
}

/// Token ranges of every window that survives the minimum-size rule.
pub fn window_spans(token_count: usize, config: &ChunkingConfig) -> Vec<Range<usize>> {
    let stride = config.stride().max(1);
    let mut spans = Vec::new();
    let mut start = 0;

    while start < token_count {
        let end = (start + config.window_tokens).min(token_count);
        if end - start >= config.min_chunk_tokens {
            spans.push(start..end);
        }
        start += stride;
    }

    spans
}

/// Splits a note body into chunks that all carry `metadata`.
pub fn chunk_note(
    body: &str,
    metadata: &NoteMetadata,
    config: &ChunkingConfig,
    codec: &dyn TokenCodec,
) -> Result<Vec<Chunk>, IngestError> {
    config.validate()?;

    if body.split_whitespace().count() < config.small_document_words {
        return Ok(vec![Chunk {
            text: body.to_string(),
            chunk_index: 0,
            total_chunks: 1,
            metadata: metadata.clone(),
        }]);
    }

    let tokens = codec.tokenize(body)?;
    let windows = window_spans(tokens.len(), config)
        .into_iter()
        .map(|span| {
            codec
                .detokenize(&tokens[span])
                .map(|text| text.trim().to_string())
        })
        .collect::<Result<Vec<_>, IngestError>>()?;

    let total_chunks = windows.len();
    Ok(windows
        .into_iter()
        .enumerate()
        .map(|(chunk_index, text)| Chunk {
            text,
            chunk_index,
            total_chunks,
            metadata: metadata.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One token per character.
    struct CharCodec;

    impl TokenCodec for CharCodec {
        fn tokenize(&self, text: &str) -> Result<Vec<u32>, IngestError> {
            Ok(text.chars().map(u32::from).collect())
        }

        fn detokenize(&self, tokens: &[u32]) -> Result<String, IngestError> {
            Ok(tokens.iter().filter_map(|token| char::from_u32(*token)).collect())
        }
    }

    fn metadata() -> NoteMetadata {
        NoteMetadata {
            path: "notes/plan.md".to_string(),
            source: "obsidian".to_string(),
            author: "unknown".to_string(),
            folder: "notes".to_string(),
            content_hash: "hash".to_string(),
            created_date: None,
            date: None,
            category: Some("여행".to_string()),
        }
    }

    fn chunk(body: &str) -> Vec<Chunk> {
        chunk_note(body, &metadata(), &ChunkingConfig::default(), &CharCodec).unwrap()
    }

    #[test]
    fn short_notes_pass_through_whole() {
        let body = "ab ".repeat(199);
        let chunks = chunk(&body);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, body);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].total_chunks, 1);
        assert_eq!(chunks[0].metadata, metadata());
    }

    #[test]
    fn two_hundred_words_take_the_window_path() {
        // 600 tokens: windows at 0 (512) and 384 (216).
        let body = "ab ".repeat(200);
        let chunks = chunk(&body);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, body[..512].trim());
        assert_eq!(chunks[1].text, body[384..].trim());
    }

    #[test]
    fn indices_are_dense_and_totals_agree() {
        let body = "word ".repeat(700);
        let chunks = chunk(&body);

        assert!(chunks.len() > 2);
        for (position, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, position);
            assert_eq!(chunk.total_chunks, chunks.len());
            assert_eq!(chunk.metadata.category.as_deref(), Some("여행"));
        }
    }

    #[test]
    fn short_trailing_window_is_dropped() {
        // 818 tokens: windows at 0, 384 and a 50-token tail at 768.
        let body = format!("{}{}", "abc ".repeat(200), "x".repeat(18));
        let chunks = chunk(&body);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].total_chunks, 2);
        assert!(chunks[1].text.ends_with("xxxxxxxxxxxxxxxxxx"));
    }

    #[test]
    fn spans_cover_every_token() {
        let config = ChunkingConfig::default();
        for token_count in [512, 600, 768, 818, 1152, 2000] {
            let spans = window_spans(token_count, &config);
            let mut covered = vec![false; token_count];
            for span in &spans {
                assert!(span.len() >= config.min_chunk_tokens);
                for slot in &mut covered[span.clone()] {
                    *slot = true;
                }
            }
            assert!(covered.iter().all(|slot| *slot), "gap at {token_count}");
        }
    }

    #[test]
    fn stride_multiple_emits_no_empty_window() {
        let config = ChunkingConfig::default();
        let spans = window_spans(384 * 3, &config);

        assert!(spans.iter().all(|span| !span.is_empty()));
        assert_eq!(spans.last().map(|span| span.end), Some(384 * 3));
    }

    #[test]
    fn overlap_must_be_smaller_than_window() {
        let config = ChunkingConfig {
            overlap_tokens: 512,
            ..ChunkingConfig::default()
        };
        let result = chunk_note("text", &metadata(), &config, &CharCodec);
        assert!(matches!(result, Err(IngestError::InvalidChunkConfig(_))));
    }

    #[test]
    fn minimum_chunk_cannot_exceed_window() {
        let config = ChunkingConfig {
            min_chunk_tokens: 600,
            ..ChunkingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(IngestError::InvalidChunkConfig(_))
        ));

        let body = "word ".repeat(600);
        let result = chunk_note(&body, &metadata(), &config, &CharCodec);
        assert!(matches!(result, Err(IngestError::InvalidChunkConfig(_))));
    }
}
