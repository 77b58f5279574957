use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use knowledge_search_core::{
    build_embedder, build_translator, load_tokenizer, resolve_folder, tag_folder, triage_folder,
    ClassifierPolicy, Config, FilenameRules, IngestionOptions, Ingestor, KeywordClassifier,
    QueryFilters, SearchCoordinator, SearchHit, SearchRequest, SupabaseStore,
};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ks", version, about = "Semantic search over exported notes")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the JSON configuration file.
    #[arg(long, global = true, env = "KS_CONFIG", default_value = "config.json")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Search the index with a natural-language query.
    Search {
        query: String,
        /// Number of results (defaults to search.default_limit).
        #[arg(long)]
        limit: Option<usize>,
        /// Only keep results from this source, e.g. obsidian.
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        author: Option<String>,
        /// Minimum similarity percentage (defaults to search.min_similarity).
        #[arg(long)]
        min_similarity: Option<f64>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Report elapsed time and average similarity.
        #[arg(long, default_value_t = false)]
        benchmark: bool,
    },
    /// Chunk, translate, embed and store every note in a folder.
    Ingest {
        /// Folder path, or a folder name under sources.obsidian.path.
        folder: String,
        #[arg(long, default_value = "obsidian")]
        source: String,
        #[arg(long, default_value = "unknown")]
        author: String,
        #[arg(long, default_value = "md")]
        extension: String,
        #[arg(long, default_value_t = false)]
        recursive: bool,
    },
    /// Show row counts per source and author.
    Status,
    /// Check that the table and search function exist.
    SetupDb,
    /// Write a `Category:` header into untagged notes based on file names.
    Tag { folder: PathBuf },
    /// List dated notes worth keeping, best score first.
    Triage {
        folder: PathBuf,
        #[arg(long, value_enum, default_value_t = Policy::Strict)]
        policy: Policy,
        /// Oldest notes to pass over before classifying.
        #[arg(long, default_value_t = knowledge_search_core::triage::DEFAULT_SKIP)]
        skip: usize,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Cleaned previews for reading.
    Text,
    /// Full records for other programs.
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Policy {
    Strict,
    Expanded,
    Lenient,
}

impl Policy {
    fn build(self) -> ClassifierPolicy {
        match self {
            Policy::Strict => ClassifierPolicy::strict(),
            Policy::Expanded => ClassifierPolicy::expanded(),
            Policy::Lenient => ClassifierPolicy::lenient(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "knowledge-search boot"
    );

    match cli.command {
        Command::Search {
            query,
            limit,
            source,
            author,
            min_similarity,
            format,
            benchmark,
        } => {
            let config = load_config(&cli.config)?;
            let coordinator = SearchCoordinator::new(
                SupabaseStore::new(&config.supabase),
                build_embedder(&config.embedding)?,
                build_translator(&config.translation)?,
                config.search,
                config.translation.target_language.clone(),
            );
            let request = SearchRequest {
                text: query,
                limit,
                min_similarity,
                filters: QueryFilters { source, author },
            };

            let started = Instant::now();
            let response = coordinator.search(&request).await?;
            let elapsed = started.elapsed();

            match format {
                OutputFormat::Json => {
                    let output = serde_json::json!({
                        "query": response.query,
                        "translated_query": response.translated_query,
                        "count": response.hits.len(),
                        "results": response.hits,
                        "elapsed_ms": benchmark
                            .then(|| (elapsed.as_secs_f64() * 10_000.0).round() / 10.0),
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    print_hits(&response.query, &response.hits)?;
                    if benchmark && !response.hits.is_empty() {
                        let average = response.hits.iter().map(|hit| hit.similarity).sum::<f64>()
                            / response.hits.len() as f64;
                        println!("search time: {}ms", elapsed.as_millis());
                        println!("average similarity: {average:.1}%");
                    }
                }
            }
        }
        Command::Ingest {
            folder,
            source,
            author,
            extension,
            recursive,
        } => {
            let config = load_config(&cli.config)?;
            let notes_root = config.notes_root();
            let folder_path = resolve_folder(&folder, notes_root.as_deref());
            let tokenizer = load_tokenizer(&config.chunking.tokenizer)
                .with_context(|| format!("loading tokenizer {}", config.chunking.tokenizer))?;

            let mut ingestor = Ingestor::new(
                SupabaseStore::new(&config.supabase),
                build_embedder(&config.embedding)?,
                build_translator(&config.translation)?,
                Box::new(tokenizer),
                config.chunking.clone(),
                config.translation.target_language.clone(),
            )?;
            if let Some(root) = notes_root.or_else(home_dir) {
                ingestor = ingestor.with_base(root);
            }

            let options = IngestionOptions {
                source,
                author,
                extension,
                recursive,
            };
            println!("indexing folder: {}", folder_path.display());
            let report = ingestor.ingest_folder(&folder_path, &options).await?;

            for failed in &report.failed {
                warn!(path = %failed.path.display(), reason = %failed.reason, "note not indexed");
                println!("  failed: {} ({})", failed.path.display(), failed.reason);
            }
            println!(
                "indexed {} of {} notes ({} empty, {} chunks)",
                report.succeeded,
                report.total(),
                report.empty,
                report.chunks
            );
            if !report.failed.is_empty() {
                println!("failed: {}", report.failed.len());
            }
        }
        Command::Status => {
            let config = load_config(&cli.config)?;
            let status = SupabaseStore::new(&config.supabase).index_status().await?;

            println!("total chunks: {}", status.total);
            if status.total > 0 {
                println!("\nby source:");
                for (source, count) in &status.by_source {
                    println!("  {source}: {count}");
                }
                println!("\nby author:");
                for (author, count) in &status.by_author {
                    println!("  {author}: {count}");
                }
            }
        }
        Command::SetupDb => {
            let config = load_config(&cli.config)?;
            let store = SupabaseStore::new(&config.supabase);

            let status = store
                .index_status()
                .await
                .context("connecting to the store")?;
            println!("connection ok ({} rows)", status.total);

            let check = store.verify_schema().await?;
            println!("{} table {}", mark(check.table), config.supabase.table);
            println!(
                "{} function {}",
                mark(check.search_function),
                config.supabase.search_function
            );

            if !check.is_complete() {
                println!(
                    "\nrun schema.sql in the SQL editor, then re-run `ks setup-db`:\n  {}",
                    sql_editor_url(&config.supabase.url)
                );
                bail!("database setup incomplete");
            }
            println!("database is fully configured");
        }
        Command::Tag { folder } => {
            let report = tag_folder(&folder, &FilenameRules::default())?;

            println!(
                "tagged {} notes, {} already tagged",
                report.tagged.len(),
                report.already_tagged.len()
            );
            for (label, count) in &report.counts {
                println!("  {label}: {count}");
            }
        }
        Command::Triage {
            folder,
            policy,
            skip,
        } => {
            let classifier = KeywordClassifier::new(policy.build())?;
            let report = triage_folder(&folder, &classifier, skip)?;

            println!(
                "{} of {} dated notes selected ({} policy, first {} skipped)",
                report.selected.len(),
                report.scanned,
                classifier.policy().name,
                skip
            );
            for label in classifier.policy().labels() {
                let notes: Vec<_> = report.in_category(&label).collect();
                if notes.is_empty() {
                    continue;
                }

                println!("\n== {label} ({}) ==", notes.len());
                for note in notes {
                    println!("\n{}. {}", note.index, note.file_name);
                    println!("   date: {}", note.created.format("%Y-%m-%d %H:%M"));
                    println!("   categories: {}", note.assessment.labels().join(", "));
                    println!(
                        "   score: {:.1} | length: {}",
                        note.assessment.score, note.assessment.length
                    );
                    println!("   preview: {}", truncate_chars(&note.preview, 120));
                }
            }
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::load(path).with_context(|| format!("loading config {}", path.display()))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "[ok]"
    } else {
        "[missing]"
    }
}

fn sql_editor_url(project_url: &str) -> String {
    let host = project_url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let project = host.split('.').next().unwrap_or(host);
    format!("https://supabase.com/dashboard/project/{project}/sql/new")
}

fn print_hits(query: &str, hits: &[SearchHit]) -> anyhow::Result<()> {
    if hits.is_empty() {
        println!("no results found; try other keywords or a lower --min-similarity");
        return Ok(());
    }

    let cleaner = PreviewCleaner::new()?;
    println!("results for '{query}' ({} found):\n", hits.len());
    for (position, hit) in hits.iter().enumerate() {
        println!("[{}] {}", position + 1, hit.path);
        match hit.final_score {
            Some(score) => println!("    similarity: {}% (ranked {score:.1})", hit.similarity),
            None => println!("    similarity: {}%", hit.similarity),
        }
        println!("    author: {} | source: {}", hit.author, hit.source);
        if !hit.text.is_empty() {
            println!("    preview: {}", cleaner.preview(&hit.text));
        }
        println!();
    }

    Ok(())
}

const PREVIEW_LINES: usize = 5;
const PREVIEW_CHARS: usize = 150;

/// Strips markup and header lines so a hit reads as its content.
struct PreviewCleaner {
    tags: Regex,
    headers: Vec<Regex>,
    blank_runs: Regex,
}

impl PreviewCleaner {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            tags: Regex::new(r"<[^>]+>")?,
            headers: vec![
                Regex::new(r"Category:.*?\n")?,
                Regex::new(r"Created:.*?\n")?,
                Regex::new(r"Modified:.*?\n")?,
                Regex::new(r"(?m)^#.*?\n")?,
                Regex::new(r"(?m)^---+\s*\n")?,
            ],
            blank_runs: Regex::new(r"\n\s*\n+")?,
        })
    }

    fn preview(&self, text: &str) -> String {
        let mut cleaned = self.tags.replace_all(text, "\n").into_owned();
        for header in &self.headers {
            cleaned = header.replace_all(&cleaned, "").into_owned();
        }
        let cleaned = self.blank_runs.replace_all(&cleaned, "\n");

        let lines: Vec<&str> = cleaned
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(PREVIEW_LINES)
            .collect();

        if lines.is_empty() {
            let fallback: String = if text.chars().count() > 300 {
                text.chars().skip(300).take(PREVIEW_CHARS).collect()
            } else {
                text.chars().take(PREVIEW_CHARS).collect()
            };
            return format!("{fallback}...");
        }

        truncate_chars(&lines.join(", "), PREVIEW_CHARS)
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        format!("{}...", text.chars().take(limit).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_drops_headers_and_markup() {
        let cleaner = PreviewCleaner::new().unwrap();
        let text = "Category: 운동/피트니스\n\n# 상체 루틴\nCreated: 2016년 2월 26일\n<div>벤치프레스</div><div>풀업</div>\n---\n덤벨 로우\n";

        assert_eq!(cleaner.preview(text), "벤치프레스, 풀업, 덤벨 로우");
    }

    #[test]
    fn preview_keeps_five_lines_and_caps_length() {
        let cleaner = PreviewCleaner::new().unwrap();
        assert_eq!(cleaner.preview("a\nb\nc\nd\ne\nf\n"), "a, b, c, d, e");

        let long = "가".repeat(200);
        let preview = cleaner.preview(&long);
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn header_only_text_falls_back_to_raw_slice() {
        let cleaner = PreviewCleaner::new().unwrap();
        assert_eq!(cleaner.preview("# title\n"), "# title\n...");
    }

    #[test]
    fn editor_url_uses_project_ref() {
        assert_eq!(
            sql_editor_url("https://abcd1234.supabase.co"),
            "https://supabase.com/dashboard/project/abcd1234/sql/new"
        );
    }

    #[test]
    fn cli_parses_search_flags() {
        let cli = Cli::try_parse_from([
            "ks",
            "search",
            "최근 계획",
            "--limit",
            "3",
            "--format",
            "json",
            "--benchmark",
        ])
        .unwrap();

        match cli.command {
            Command::Search {
                query,
                limit,
                format,
                benchmark,
                ..
            } => {
                assert_eq!(query, "최근 계획");
                assert_eq!(limit, Some(3));
                assert!(format == OutputFormat::Json);
                assert!(benchmark);
            }
            _ => panic!("expected search"),
        }
    }
}
