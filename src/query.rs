use crate::document::{PhotoHit, SearchResponse, SearchResult};
use crate::error::AppError;
use crate::keywords::KeywordInterpreter;
use crate::search::PhotoIndex;
use std::sync::Arc;

/// Public URL of a stored photo.
pub fn photo_url(bucket: &str, object_key: &str, region: &str) -> String {
    format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, object_key)
}

/// Projects index hits into results, keeping the index's order.
pub fn shape_results(hits: Vec<PhotoHit>, region: &str) -> Vec<SearchResult> {
    hits.into_iter()
        .map(|hit| SearchResult {
            url: photo_url(&hit.bucket, &hit.object_key, region),
            labels: hit.labels.unwrap_or_default().into_iter().collect(),
        })
        .collect()
}

pub struct QueryPipeline {
    interpreter: Arc<dyn KeywordInterpreter>,
    index: Arc<dyn PhotoIndex>,
    region: String,
}

impl QueryPipeline {
    pub fn new(
        interpreter: Arc<dyn KeywordInterpreter>,
        index: Arc<dyn PhotoIndex>,
        region: &str,
    ) -> Self {
        Self {
            interpreter,
            index,
            region: region.to_string(),
        }
    }

    /// Rejects blank text before anything else runs.
    pub async fn search(&self, raw_text: Option<&str>) -> Result<SearchResponse, AppError> {
        let raw_text = match raw_text {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Err(AppError::BadRequest("Missing query parameter \"q\"".to_string())),
        };
        log::info!("Search query: {}", raw_text);

        let keywords = self.interpreter.interpret(raw_text).await;
        log::debug!("Using keywords: {:?}", keywords);

        let hits = self.execute(&keywords).await;
        let results = shape_results(hits, &self.region);
        log::info!("Found {} results.", results.len());
        Ok(SearchResponse { results })
    }

    /// OR-match of the keywords against labels. Index errors are logged and
    /// read as "no results".
    pub async fn execute(&self, keywords: &[String]) -> Vec<PhotoHit> {
        if keywords.is_empty() {
            return Vec::new();
        }
        match self.index.search_labels(keywords).await {
            Ok(hits) => hits,
            Err(e) => {
                log::error!("Error searching index: {}", e);
                Vec::new()
            }
        }
    }
}
