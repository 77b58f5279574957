use crate::config::StoreConfig;
use crate::traits::VectorIndex;
use crate::{SearchError, StoreMatch, StoredChunk};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;

const BACKEND: &str = "supabase";

/// PostgREST front of a hosted Postgres table with a similarity function.
pub struct SupabaseStore {
    endpoint: String,
    key: String,
    table: String,
    search_function: String,
    client: Client,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IndexStatus {
    pub total: usize,
    /// Largest group first.
    pub by_source: Vec<(String, usize)>,
    pub by_author: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SchemaCheck {
    pub table: bool,
    pub search_function: bool,
}

impl SchemaCheck {
    pub fn is_complete(&self) -> bool {
        self.table && self.search_function
    }
}

impl SupabaseStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            endpoint: config.url.trim_end_matches('/').to_string(),
            key: config.key.clone(),
            table: config.table.clone(),
            search_function: config.search_function.clone(),
            client: Client::new(),
        }
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.endpoint, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.key).bearer_auth(&self.key)
    }

    /// Row count plus per-source and per-author breakdowns.
    pub async fn index_status(&self) -> Result<IndexStatus, SearchError> {
        let response = self
            .authorized(self.client.get(self.rest_url(&self.table)))
            .query(&[("select", "metadata")])
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let total = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .and_then(total_from_content_range);
        let rows: Vec<Value> = response.json().await?;

        Ok(summarize_rows(&rows, total))
    }

    pub async fn verify_schema(&self) -> Result<SchemaCheck, SearchError> {
        let table = self
            .authorized(self.client.get(self.rest_url(&self.table)))
            .query(&[("select", "*"), ("limit", "1")])
            .send()
            .await?
            .status()
            .is_success();

        let response = self
            .authorized(
                self.client
                    .post(self.rest_url(&format!("rpc/{}", self.search_function))),
            )
            .json(&json!({}))
            .send()
            .await?;
        let search_function = if response.status().is_success() {
            true
        } else {
            let body = response.text().await.unwrap_or_default();
            function_exists_from_error(&body)
        };

        Ok(SchemaCheck {
            table,
            search_function,
        })
    }
}

#[async_trait]
impl VectorIndex for SupabaseStore {
    async fn insert(&self, embedding: &[f32], record: &StoredChunk) -> Result<(), SearchError> {
        let response = self
            .authorized(self.client.post(self.rest_url(&self.table)))
            .header("Prefer", "return=minimal")
            .json(&json!({
                "embedding": embedding,
                "metadata": record,
            }))
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn similarity_search(
        &self,
        query_vector: &[f32],
        threshold: f64,
        count: usize,
    ) -> Result<Vec<StoreMatch>, SearchError> {
        let response = self
            .authorized(
                self.client
                    .post(self.rest_url(&format!("rpc/{}", self.search_function))),
            )
            .json(&json!({
                "query_embedding": query_vector,
                "match_threshold": threshold,
                "match_count": count,
            }))
            .send()
            .await?;

        let parsed: Value = ensure_success(response).await?.json().await?;
        parse_matches(parsed)
    }
}

async fn ensure_success(response: Response) -> Result<Response, SearchError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(SearchError::BackendResponse {
        backend: BACKEND.to_string(),
        details: format!("{status}: {body}"),
    })
}

fn parse_matches(parsed: Value) -> Result<Vec<StoreMatch>, SearchError> {
    let Value::Array(rows) = parsed else {
        return Err(SearchError::BackendResponse {
            backend: BACKEND.to_string(),
            details: "similarity search did not return a row array".to_string(),
        });
    };

    Ok(rows
        .into_iter()
        .map(|row| StoreMatch {
            similarity: row
                .pointer("/similarity")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            metadata: row.get("metadata").cloned().unwrap_or(Value::Null),
        })
        .collect())
}

/// `Content-Range: 0-999/3573` → `3573`.
fn total_from_content_range(header: &str) -> Option<usize> {
    header.rsplit_once('/')?.1.parse().ok()
}

fn summarize_rows(rows: &[Value], total: Option<usize>) -> IndexStatus {
    let mut by_source = HashMap::<String, usize>::new();
    let mut by_author = HashMap::<String, usize>::new();

    for row in rows {
        let field = |name: &str| {
            row.pointer(&format!("/metadata/{name}"))
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string()
        };
        *by_source.entry(field("source")).or_default() += 1;
        *by_author.entry(field("author")).or_default() += 1;
    }

    IndexStatus {
        total: total.unwrap_or(rows.len()),
        by_source: ranked(by_source),
        by_author: ranked(by_author),
    }
}

fn ranked(counts: HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
    counts
}

/// A failing call with bad arguments still proves the function exists;
/// only "missing" errors count against it.
fn function_exists_from_error(body: &str) -> bool {
    let lowered = body.to_lowercase();
    !(lowered.contains("not found") || lowered.contains("does not exist"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_become_matches() {
        let parsed = json!([
            { "id": 1, "similarity": 0.82, "metadata": { "path": "a.md" } },
            { "id": 2, "metadata": { "path": "b.md" } }
        ]);
        let matches = parse_matches(parsed).unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].similarity, 0.82);
        assert_eq!(matches[0].metadata["path"], "a.md");
        assert_eq!(matches[1].similarity, 0.0);
    }

    #[test]
    fn non_array_response_is_an_error() {
        let result = parse_matches(json!({ "message": "boom" }));
        assert!(matches!(result, Err(SearchError::BackendResponse { .. })));
    }

    #[test]
    fn status_counts_sources_and_authors() {
        let rows = vec![
            json!({ "metadata": { "source": "apple-notes", "author": "jw" } }),
            json!({ "metadata": { "source": "obsidian", "author": "jw" } }),
            json!({ "metadata": { "source": "apple-notes" } }),
        ];
        let status = summarize_rows(&rows, Some(40));

        assert_eq!(status.total, 40);
        assert_eq!(
            status.by_source,
            vec![("apple-notes".to_string(), 2), ("obsidian".to_string(), 1)]
        );
        assert_eq!(
            status.by_author,
            vec![("jw".to_string(), 2), ("unknown".to_string(), 1)]
        );
        assert_eq!(summarize_rows(&rows, None).total, 3);
    }

    #[test]
    fn content_range_total_is_parsed() {
        assert_eq!(total_from_content_range("0-999/3573"), Some(3573));
        assert_eq!(total_from_content_range("*/0"), Some(0));
        assert_eq!(total_from_content_range("0-9/*"), None);
    }

    #[test]
    fn missing_function_errors_are_recognized() {
        assert!(!function_exists_from_error(
            r#"{"message":"function public.search_embeddings() does not exist"}"#
        ));
        assert!(function_exists_from_error(
            r#"{"message":"missing required argument query_embedding"}"#
        ));
    }

    #[test]
    fn endpoint_trailing_slash_is_ignored() {
        let store = SupabaseStore::new(&StoreConfig {
            url: "https://project.supabase.co/".to_string(),
            key: "anon".to_string(),
            table: "embeddings".to_string(),
            search_function: "search_embeddings".to_string(),
        });
        assert_eq!(
            store.rest_url("rpc/search_embeddings"),
            "https://project.supabase.co/rest/v1/rpc/search_embeddings"
        );
    }
}
