use crate::document::{PhotoDocument, PhotoHit};
use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait PhotoIndex: Send + Sync {
    /// Creates the document under `object_key`, or fully replaces it.
    async fn upsert_document(&self, document: &PhotoDocument) -> Result<(), AppError>;
    /// Documents whose labels match at least one keyword, in relevance order.
    async fn search_labels(&self, keywords: &[String]) -> Result<Vec<PhotoHit>, AppError>;
}
