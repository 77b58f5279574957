use crate::chunking::{chunk_note, ChunkingConfig};
use crate::classify::parse_category_tag;
use crate::config::expand_home;
use crate::dates::CreatedDateParser;
use crate::providers::translate_or_original;
use crate::traits::{Embedder, TokenCodec, Translator, VectorIndex};
use crate::{IngestError, IngestionOptions, InputKind, NoteMetadata, StoredChunk};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Note files under `folder` with the configured extension, sorted.
pub fn discover_note_files(folder: &Path, options: &IngestionOptions) -> Vec<PathBuf> {
    let walker = WalkDir::new(folder).min_depth(1);
    let walker = if options.recursive {
        walker
    } else {
        walker.max_depth(1)
    };

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|item| item.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&options.extension))
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort_unstable();
    files
}

pub fn digest_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `folder` as given when it exists, otherwise joined onto the notes root.
pub fn resolve_folder(folder: &str, notes_root: Option<&Path>) -> PathBuf {
    let direct = expand_home(Path::new(folder));
    if direct.exists() {
        return direct;
    }

    match notes_root {
        Some(root) => root.join(folder),
        None => direct,
    }
}

pub fn build_metadata(
    path: &Path,
    content: &str,
    base: Option<&Path>,
    options: &IngestionOptions,
    dates: &CreatedDateParser,
) -> Result<NoteMetadata, IngestError> {
    if path.file_name().is_none() {
        return Err(IngestError::MissingFileName(path.display().to_string()));
    }

    let display_path = base
        .and_then(|base| path.strip_prefix(base).ok())
        .unwrap_or(path);
    let folder = path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let metadata = NoteMetadata {
        path: display_path.to_string_lossy().to_string(),
        source: options.source.clone(),
        author: options.author.clone(),
        folder,
        content_hash: digest_content(content),
        created_date: None,
        date: None,
        category: None,
    };

    Ok(metadata
        .with_created(dates.parse(content))
        .with_category(parse_category_tag(content)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Whitespace-only note; nothing was sent anywhere.
    Empty,
    Stored { chunks: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedNote {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionReport {
    /// Includes empty notes.
    pub succeeded: usize,
    pub empty: usize,
    pub chunks: usize,
    pub failed: Vec<FailedNote>,
}

impl IngestionReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }
}

/// Reads notes one at a time and pushes every chunk through
/// translate → embed → insert.
pub struct Ingestor<V: VectorIndex> {
    store: V,
    embedder: Box<dyn Embedder>,
    translator: Box<dyn Translator>,
    codec: Box<dyn TokenCodec>,
    chunking: ChunkingConfig,
    target_language: String,
    dates: CreatedDateParser,
    base: Option<PathBuf>,
}

impl<V> Ingestor<V>
where
    V: VectorIndex + Send + Sync,
{
    pub fn new(
        store: V,
        embedder: Box<dyn Embedder>,
        translator: Box<dyn Translator>,
        codec: Box<dyn TokenCodec>,
        chunking: ChunkingConfig,
        target_language: impl Into<String>,
    ) -> Result<Self, IngestError> {
        chunking.validate()?;

        Ok(Self {
            store,
            embedder,
            translator,
            codec,
            chunking,
            target_language: target_language.into(),
            dates: CreatedDateParser::new()?,
            base: None,
        })
    }

    /// Stored paths become relative to `base` when they live under it.
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        self.base = Some(fs::canonicalize(&base).unwrap_or(base));
        self
    }

    pub fn store(&self) -> &V {
        &self.store
    }

    pub async fn ingest_file(
        &self,
        path: &Path,
        options: &IngestionOptions,
    ) -> Result<FileOutcome, IngestError> {
        let path = &fs::canonicalize(path)?;
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            debug!(path = %path.display(), "skipping empty note");
            return Ok(FileOutcome::Empty);
        }

        let metadata = build_metadata(path, &content, self.base.as_deref(), options, &self.dates)?;
        let chunks = chunk_note(&content, &metadata, &self.chunking, self.codec.as_ref())?;
        debug!(path = %path.display(), chunks = chunks.len(), "note chunked");

        for chunk in &chunks {
            let translated = translate_or_original(
                self.translator.as_ref(),
                &chunk.text,
                &self.target_language,
                InputKind::Document,
            )
            .await;
            let embedding = self.embedder.embed(&translated, InputKind::Document).await?;
            self.store
                .insert(&embedding, &StoredChunk::new(chunk, translated))
                .await?;
        }

        Ok(FileOutcome::Stored {
            chunks: chunks.len(),
        })
    }

    /// Ingests every matching note in `folder`. A failing note is recorded
    /// in the report and the batch moves on.
    pub async fn ingest_folder(
        &self,
        folder: &Path,
        options: &IngestionOptions,
    ) -> Result<IngestionReport, IngestError> {
        if !folder.is_dir() {
            return Err(IngestError::InvalidArgument(format!(
                "folder not found: {}",
                folder.display()
            )));
        }

        let files = discover_note_files(folder, options);
        if files.is_empty() {
            return Err(IngestError::InvalidArgument(format!(
                "no .{} files found in {}",
                options.extension,
                folder.display()
            )));
        }

        info!(
            folder = %folder.display(),
            files = files.len(),
            source = %options.source,
            author = %options.author,
            embedder = self.embedder.model_name(),
            "ingesting notes"
        );

        let mut report = IngestionReport::default();
        for (position, path) in files.into_iter().enumerate() {
            match self.ingest_file(&path, options).await {
                Ok(FileOutcome::Empty) => {
                    report.succeeded += 1;
                    report.empty += 1;
                }
                Ok(FileOutcome::Stored { chunks }) => {
                    info!(index = position + 1, path = %path.display(), chunks, "note stored");
                    report.succeeded += 1;
                    report.chunks += chunks;
                }
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "note failed");
                    report.failed.push(FailedNote {
                        path,
                        reason: error.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}
