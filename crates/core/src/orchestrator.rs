use crate::config::SearchSettings;
use crate::providers::translate_or_original;
use crate::ranking::{rank_matches, RankingOptions};
use crate::traits::{Embedder, Translator, VectorIndex};
use crate::{InputKind, SearchError, SearchRequest, SearchResponse};
use chrono::{Local, NaiveDate};
use tracing::{debug, info};

/// Over-fetch factor applied to the store call so local filters still
/// leave enough rows to fill the limit.
pub const OVERFETCH_FACTOR: usize = 5;

/// Query pipeline: translate → embed → store lookup → filter → rank.
/// Holds no per-query state.
pub struct SearchCoordinator<V>
where
    V: VectorIndex,
{
    store: V,
    embedder: Box<dyn Embedder>,
    translator: Box<dyn Translator>,
    settings: SearchSettings,
    target_language: String,
}

impl<V> SearchCoordinator<V>
where
    V: VectorIndex + Send + Sync,
{
    pub fn new(
        store: V,
        embedder: Box<dyn Embedder>,
        translator: Box<dyn Translator>,
        settings: SearchSettings,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            store,
            embedder,
            translator,
            settings,
            target_language: target_language.into(),
        }
    }

    pub fn store(&self) -> &V {
        &self.store
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        self.search_on(request, Local::now().date_naive()).await
    }

    /// Same as [`search`](Self::search) with recency measured from `today`.
    pub async fn search_on(
        &self,
        request: &SearchRequest,
        today: NaiveDate,
    ) -> Result<SearchResponse, SearchError> {
        if request.text.trim().is_empty() {
            return Err(SearchError::Request("query is empty".to_string()));
        }

        let limit = request.limit.unwrap_or(self.settings.default_limit);
        let min_similarity = request
            .min_similarity
            .unwrap_or(self.settings.min_similarity);
        if limit == 0 {
            return Err(SearchError::Request("limit must be >= 1".to_string()));
        }
        if !(0.0..=100.0).contains(&min_similarity) {
            return Err(SearchError::Request(format!(
                "min_similarity {min_similarity} is outside [0, 100]"
            )));
        }

        let translated = translate_or_original(
            self.translator.as_ref(),
            &request.text,
            &self.target_language,
            InputKind::Query,
        )
        .await;
        if translated != request.text {
            info!(query = %request.text, translated = %translated, "searching translated query");
        } else {
            info!(query = %request.text, "searching");
        }

        let query_vector = self.embedder.embed(&translated, InputKind::Query).await?;
        let matches = self
            .store
            .similarity_search(
                &query_vector,
                min_similarity / 100.0,
                limit.saturating_mul(OVERFETCH_FACTOR),
            )
            .await?;
        debug!(rows = matches.len(), "store returned candidates");

        let hits = rank_matches(
            matches,
            &request.text,
            &RankingOptions {
                filters: &request.filters,
                min_similarity,
                limit,
                today,
            },
        );

        Ok(SearchResponse {
            query: request.text.clone(),
            translated_query: (translated != request.text).then_some(translated),
            hits,
        })
    }
}
