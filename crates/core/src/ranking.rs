use crate::{QueryFilters, SearchHit, StoreMatch};
use chrono::NaiveDate;
use serde_json::Value;

pub const TEMPORAL_TERMS: &[&str] = &[
    "지금", "현재", "최근", "최신", "오늘", "now", "current", "latest", "recent", "today",
];

pub const SIMILARITY_WEIGHT: f64 = 0.6;
pub const RECENCY_WEIGHT: f64 = 0.4;

pub const RECENCY_HORIZON_DAYS: f64 = 1000.0;

#[derive(Debug, Clone)]
pub struct RankingOptions<'a> {
    pub filters: &'a QueryFilters,
    pub min_similarity: f64,
    pub limit: usize,
    pub today: NaiveDate,
}

pub fn has_temporal_intent(query: &str) -> bool {
    let lowered = query.to_lowercase();
    TEMPORAL_TERMS.iter().any(|term| lowered.contains(term))
}

pub fn similarity_percent(raw: f64) -> f64 {
    (raw * 1000.0).round() / 10.0
}

// `max(0, 100 − days_ago / 10)`; undated or unparseable notes score 0.
pub fn recency_score(date: Option<&str>, today: NaiveDate) -> f64 {
    let Some(date) = date else {
        return 0.0;
    };
    let day = date.get(..10).unwrap_or(date);
    let Ok(created) = NaiveDate::parse_from_str(day, "%Y-%m-%d") else {
        return 0.0;
    };

    let days_ago = (today - created).num_days() as f64;
    (100.0 - days_ago * 100.0 / RECENCY_HORIZON_DAYS).max(0.0)
}

pub fn rank_matches(
    matches: Vec<StoreMatch>,
    query: &str,
    options: &RankingOptions<'_>,
) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = matches
        .into_iter()
        .filter_map(|row| hit_from_match(row, options.filters))
        .filter(|hit| hit.similarity >= options.min_similarity)
        .collect();

    if has_temporal_intent(query) && !hits.is_empty() {
        for hit in &mut hits {
            let recency = recency_score(hit.date.as_deref(), options.today);
            hit.final_score = Some(hit.similarity * SIMILARITY_WEIGHT + recency * RECENCY_WEIGHT);
        }
        hits.sort_by(|left, right| {
            let left = left.final_score.unwrap_or(left.similarity);
            let right = right.final_score.unwrap_or(right.similarity);
            right.total_cmp(&left)
        });
    } else {
        hits.sort_by(|left, right| right.similarity.total_cmp(&left.similarity));
    }

    hits.truncate(options.limit);
    hits
}

fn hit_from_match(row: StoreMatch, filters: &QueryFilters) -> Option<SearchHit> {
    let metadata = &row.metadata;
    let field = |name: &str| metadata.get(name).and_then(Value::as_str);

    if !field_matches(field("source"), filters.source.as_deref()) {
        return None;
    }
    if !field_matches(field("author"), filters.author.as_deref()) {
        return None;
    }

    let original = field("text_original").unwrap_or_default();
    let translated = field("text").unwrap_or_default();

    Some(SearchHit {
        path: field("path").unwrap_or_default().to_string(),
        text: if original.is_empty() {
            translated.to_string()
        } else {
            original.to_string()
        },
        text_translated: translated.to_string(),
        similarity: similarity_percent(row.similarity),
        author: field("author").unwrap_or("unknown").to_string(),
        source: field("source").unwrap_or("unknown").to_string(),
        date: field("date")
            .filter(|date| !date.is_empty())
            .map(str::to_string),
        final_score: None,
    })
}

fn field_matches(value: Option<&str>, wanted: Option<&str>) -> bool {
    match wanted.filter(|wanted| !wanted.is_empty()) {
        Some(wanted) => value == Some(wanted),
        None => true,
    }
}
