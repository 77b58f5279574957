pub mod chunking;
pub mod classify;
pub mod config;
pub mod dates;
pub mod error;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod ranking;
pub mod stores;
pub mod traits;
pub mod triage;

pub use chunking::{chunk_note, load_tokenizer, window_spans, ChunkingConfig, DEFAULT_TOKENIZER};
pub use classify::{
    apply_category_tag, parse_category_tag, Assessment, CategoryScore, ClassifierPolicy,
    FilenameRules, KeywordClassifier, TagOutcome,
};
pub use config::{expand_home, Config, EmbeddingConfig, SearchSettings, StoreConfig, TranslationConfig};
pub use dates::CreatedDateParser;
pub use error::{ConfigError, IngestError, ProviderError, SearchError};
pub use ingest::{
    build_metadata, digest_content, discover_note_files, resolve_folder, FailedNote, FileOutcome,
    IngestionReport, Ingestor,
};
pub use models::{
    Chunk, IngestionOptions, InputKind, NoteMetadata, QueryFilters, SearchHit, SearchRequest,
    SearchResponse, StoreMatch, StoredChunk,
};
pub use orchestrator::SearchCoordinator;
pub use providers::{build_embedder, build_translator, translate_or_original, NoTranslation};
pub use ranking::{has_temporal_intent, rank_matches, RankingOptions};
pub use stores::{IndexStatus, SchemaCheck, SupabaseStore};
pub use traits::{Embedder, TokenCodec, Translator, VectorIndex};
pub use triage::{tag_folder, triage_folder, TagReport, TriageReport, TriagedNote};
