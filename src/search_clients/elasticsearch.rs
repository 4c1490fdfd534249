use crate::config::AppConfig;
use crate::document::{PhotoDocument, PhotoHit};
use crate::error::AppError;
use crate::search::PhotoIndex;
use async_trait::async_trait;
use elasticsearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    Elasticsearch, IndexParts, SearchParts,
};
use serde_json::{json, Value};
use url::Url;

pub struct ElasticsearchSearcher {
    client: Elasticsearch,
    index_name: String,
}

impl ElasticsearchSearcher {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        log::debug!("Creating Elasticsearch client for URL: {}", config.elasticsearch_url);
        let url = Url::parse(&config.elasticsearch_url)?;
        let conn_pool = SingleNodeConnectionPool::new(url);
        let transport = TransportBuilder::new(conn_pool).disable_proxy().build()?;
        let client = Elasticsearch::new(transport);
        log::trace!("Elasticsearch client created successfully.");
        Ok(Self {
            client,
            index_name: config.index_name.clone(),
        })
    }
}

/// `bool.should` with one `match` per keyword: a document matches when any
/// keyword matches its labels.
pub(crate) fn labels_query(keywords: &[String]) -> Value {
    let should: Vec<Value> = keywords
        .iter()
        .map(|keyword| json!({ "match": { "labels": keyword } }))
        .collect();
    json!({
        "query": { "bool": { "should": should } },
        "_source": ["objectKey", "bucket", "labels"]
    })
}

pub(crate) fn parse_hits(body: &Value) -> Result<Vec<PhotoHit>, AppError> {
    let mut hits = Vec::new();
    if let Some(raw_hits) = body["hits"]["hits"].as_array() {
        for hit in raw_hits {
            if hit["_source"].is_object() {
                hits.push(serde_json::from_value(hit["_source"].clone())?);
            }
        }
    }
    Ok(hits)
}

#[async_trait]
impl PhotoIndex for ElasticsearchSearcher {
    async fn upsert_document(&self, document: &PhotoDocument) -> Result<(), AppError> {
        log::debug!("Indexing document {} into '{}'", document.object_key, self.index_name);
        self.client
            .index(IndexParts::IndexId(&self.index_name, &document.object_key))
            .body(document)
            .send()
            .await?
            .error_for_status_code()?;
        log::debug!("Document indexed: {}", document.object_key);
        Ok(())
    }

    async fn search_labels(&self, keywords: &[String]) -> Result<Vec<PhotoHit>, AppError> {
        log::debug!("Searching '{}' for labels: {:?}", self.index_name, keywords);
        let response = self
            .client
            .search(SearchParts::Index(&[self.index_name.as_str()]))
            .body(labels_query(keywords))
            .send()
            .await?
            .error_for_status_code()?;

        let body = response.json::<Value>().await?;
        log::trace!("Elasticsearch search response: {:?}", body);

        let hits = parse_hits(&body)?;
        log::debug!("Found {} photos in Elasticsearch", hits.len());
        Ok(hits)
    }
}
