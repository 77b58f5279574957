use crate::classify::{apply_category_tag, Assessment, FilenameRules, KeywordClassifier, TagOutcome};
use crate::dates::CreatedDateParser;
use crate::ingest::discover_note_files;
use crate::{IngestError, IngestionOptions};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SKIPPED_PREFIXES: &[&str] = &["README", "SETUP", "note-list"];

pub const DEFAULT_SKIP: usize = 100;

const PREVIEW_CHARS: usize = 300;

#[derive(Debug, Clone, PartialEq)]
pub struct TriagedNote {
    // 1-based position in creation order.
    pub index: usize,
    pub file_name: String,
    pub created: NaiveDateTime,
    pub assessment: Assessment,
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriageReport {
    pub scanned: usize,
    pub selected: Vec<TriagedNote>,
}

impl TriageReport {
    pub fn in_category<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a TriagedNote> + 'a {
        self.selected
            .iter()
            .filter(move |note| note.assessment.labels().contains(&label))
    }
}

fn is_export_artifact(file_name: &str) -> bool {
    SKIPPED_PREFIXES
        .iter()
        .any(|prefix| file_name.starts_with(prefix))
}

fn file_name_of(path: &Path) -> Result<String, IngestError> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))
}

pub fn triage_folder(
    folder: &Path,
    classifier: &KeywordClassifier,
    skip: usize,
) -> Result<TriageReport, IngestError> {
    let dates = CreatedDateParser::new()?;
    let mut dated = Vec::new();

    for path in discover_note_files(folder, &IngestionOptions::default()) {
        let file_name = file_name_of(&path)?;
        if is_export_artifact(&file_name) {
            continue;
        }

        let Ok(content) = fs::read_to_string(&path) else {
            debug!(path = %path.display(), "skipping unreadable note");
            continue;
        };
        if let Some(created) = dates.parse(&content) {
            dated.push((created, file_name, content));
        }
    }

    dated.sort_by(|left, right| left.0.cmp(&right.0));
    let scanned = dated.len();

    let mut selected: Vec<TriagedNote> = dated
        .into_iter()
        .enumerate()
        .skip(skip)
        .filter_map(|(position, (created, file_name, content))| {
            let assessment = classifier.classify(&file_name, &content)?;
            Some(TriagedNote {
                index: position + 1,
                preview: preview(&content),
                file_name,
                created,
                assessment,
            })
        })
        .collect();

    selected.sort_by(|left, right| right.assessment.score.total_cmp(&left.assessment.score));
    info!(
        policy = %classifier.policy().name,
        scanned,
        selected = selected.len(),
        "triage finished"
    );

    Ok(TriageReport { scanned, selected })
}

fn preview(content: &str) -> String {
    content
        .chars()
        .take(PREVIEW_CHARS)
        .collect::<String>()
        .replace('\n', " ")
        .trim()
        .to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagReport {
    pub tagged: Vec<(PathBuf, String)>,
    pub already_tagged: Vec<PathBuf>,
    pub counts: Vec<(String, usize)>,
}

pub fn tag_folder(folder: &Path, rules: &FilenameRules) -> Result<TagReport, IngestError> {
    if !folder.is_dir() {
        return Err(IngestError::InvalidArgument(format!(
            "folder not found: {}",
            folder.display()
        )));
    }

    let files = discover_note_files(folder, &IngestionOptions::default());
    if files.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no .md files found in {}",
            folder.display()
        )));
    }

    let mut report = TagReport::default();
    let mut counts = HashMap::<String, usize>::new();

    for path in files {
        let label = rules.categorize(&file_name_of(&path)?).to_string();
        *counts.entry(label.clone()).or_default() += 1;

        let content = fs::read_to_string(&path)?;
        match apply_category_tag(&content, &label) {
            TagOutcome::AlreadyTagged => report.already_tagged.push(path),
            TagOutcome::Tagged(updated) => {
                fs::write(&path, updated)?;
                debug!(path = %path.display(), label = %label, "tagged note");
                report.tagged.push((path, label));
            }
        }
    }

    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
    report.counts = counts;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ClassifierPolicy, CATEGORY_TAG, IDEA};
    use tempfile::tempdir;

    fn created(day: u32) -> String {
        format!("Created: 2020년 3월 {day}일 월요일 오전 9:00:00\n")
    }

    fn idea_body() -> String {
        format!(
            "{}\n",
            "창업 아이디어 사업 서비스 플랫폼 구상. ".repeat(20)
        )
    }

    #[test]
    fn triage_orders_skips_and_scores() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        fs::write(base.join("README.md"), format!("{}{}", created(1), idea_body()))?;
        fs::write(base.join("undated.md"), idea_body())?;
        fs::write(base.join("first.md"), format!("{}{}", created(2), idea_body()))?;
        fs::write(base.join("second.md"), format!("{}{}", created(3), idea_body()))?;
        fs::write(base.join("third.md"), format!("{}짧은 메모\n", created(4)))?;

        let classifier = KeywordClassifier::new(ClassifierPolicy::lenient())?;
        let report = triage_folder(base, &classifier, 1)?;

        assert_eq!(report.scanned, 3);
        let names: Vec<_> = report
            .selected
            .iter()
            .map(|note| (note.index, note.file_name.as_str()))
            .collect();
        assert_eq!(names, vec![(2, "second.md")]);
        assert_eq!(report.in_category(IDEA).count(), 1);
        assert!(report.selected[0].preview.starts_with("Created: 2020년"));
        Ok(())
    }

    #[test]
    fn zero_skip_keeps_every_dated_note() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.md"), format!("{}{}", created(5), idea_body()))?;
        fs::write(dir.path().join("b.md"), format!("{}{}", created(6), idea_body()))?;

        let classifier = KeywordClassifier::new(ClassifierPolicy::lenient())?;
        let report = triage_folder(dir.path(), &classifier, 0)?;
        let indices: Vec<_> = report.selected.iter().map(|note| note.index).collect();
        assert_eq!(indices, vec![1, 2]);
        Ok(())
    }

    #[test]
    fn tagging_writes_headers_once() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let workout = dir.path().join("상체 루틴.md");
        let misc = dir.path().join("잡동사니.md");
        let tagged = dir.path().join("영화 목록.md");
        fs::write(&workout, "벤치프레스 5세트")?;
        fs::write(&misc, "메모")?;
        fs::write(&tagged, format!("{CATEGORY_TAG} 엔터테인먼트\n\n목록"))?;

        let report = tag_folder(dir.path(), &FilenameRules::default())?;
        assert_eq!(report.tagged.len(), 2);
        assert_eq!(report.already_tagged, vec![tagged.clone()]);
        assert_eq!(
            fs::read_to_string(&workout)?,
            "Category: 운동/피트니스\n\n벤치프레스 5세트"
        );
        assert_eq!(fs::read_to_string(&misc)?, "Category: 기타\n\n메모");
        assert_eq!(report.counts.len(), 3);
        assert!(report.counts.iter().all(|(_, count)| *count == 1));

        let again = tag_folder(dir.path(), &FilenameRules::default())?;
        assert!(again.tagged.is_empty());
        assert_eq!(again.already_tagged.len(), 3);
        assert_eq!(fs::read_to_string(&misc)?, "Category: 기타\n\n메모");
        Ok(())
    }

    #[test]
    fn tagging_requires_notes() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        assert!(matches!(
            tag_folder(dir.path(), &FilenameRules::default()),
            Err(IngestError::InvalidArgument(_))
        ));
        assert!(matches!(
            tag_folder(&dir.path().join("missing"), &FilenameRules::default()),
            Err(IngestError::InvalidArgument(_))
        ));
        Ok(())
    }
}
