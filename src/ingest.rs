use crate::collaborators::{ObjectMetadataSource, VisionLabeler};
use crate::document::PhotoDocument;
use crate::error::AppError;
use crate::labels::{extract_labels, merge_labels, parse_custom_labels, CUSTOM_LABELS_KEY};
use crate::search::PhotoIndex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identifies a newly stored photo.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRef {
    pub bucket: String,
    pub object_key: String,
}

/// Accepted ingestion payloads: a bare photo reference, or an object-created
/// notification carrying one or more records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IngestRequest {
    Notification {
        #[serde(rename = "Records")]
        records: Vec<NotificationRecord>,
    },
    Photo(PhotoRef),
}

#[derive(Debug, Deserialize)]
pub struct NotificationRecord {
    s3: NotificationEntity,
}

#[derive(Debug, Deserialize)]
struct NotificationEntity {
    bucket: NotificationBucket,
    object: NotificationObject,
}

#[derive(Debug, Deserialize)]
struct NotificationBucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct NotificationObject {
    key: String,
}

impl IngestRequest {
    pub fn into_photos(self) -> Vec<PhotoRef> {
        match self {
            IngestRequest::Photo(photo) => vec![photo],
            IngestRequest::Notification { records } => records
                .into_iter()
                .map(|record| PhotoRef {
                    bucket: record.s3.bucket.name,
                    object_key: record.s3.object.key,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    pub message: String,
    pub object_key: String,
}

/// Label extraction, merge, document build and index write for one photo.
pub struct IngestionPipeline {
    vision: Arc<dyn VisionLabeler>,
    object_metadata: Arc<dyn ObjectMetadataSource>,
    index: Arc<dyn PhotoIndex>,
}

impl IngestionPipeline {
    pub fn new(
        vision: Arc<dyn VisionLabeler>,
        object_metadata: Arc<dyn ObjectMetadataSource>,
        index: Arc<dyn PhotoIndex>,
    ) -> Self {
        Self {
            vision,
            object_metadata,
            index,
        }
    }

    pub async fn ingest(&self, photo: &PhotoRef) -> Result<IngestOutcome, AppError> {
        log::info!("Ingesting {}/{}", photo.bucket, photo.object_key);

        let vision_labels =
            extract_labels(self.vision.as_ref(), &photo.bucket, &photo.object_key).await?;
        let metadata = self
            .object_metadata
            .object_metadata(&photo.bucket, &photo.object_key)
            .await?;
        let custom_labels =
            parse_custom_labels(metadata.get(CUSTOM_LABELS_KEY).map(String::as_str));

        let labels = merge_labels(vision_labels, custom_labels);
        if labels.is_empty() {
            log::warn!("No labels for {}; indexing it anyway", photo.object_key);
        }
        log::debug!("Labels for {}: {:?}", photo.object_key, labels);

        let document = PhotoDocument::new(&photo.bucket, &photo.object_key, labels);
        self.index.upsert_document(&document).await?;
        log::info!("Photo indexed: {}", photo.object_key);

        Ok(IngestOutcome {
            message: "Photo indexed".to_string(),
            object_key: photo.object_key.clone(),
        })
    }

    /// Ingests photos in order and stops at the first failure.
    pub async fn ingest_all(&self, photos: &[PhotoRef]) -> Result<IngestOutcome, AppError> {
        let mut outcome = None;
        for photo in photos {
            outcome = Some(self.ingest(photo).await?);
        }
        outcome.ok_or_else(|| AppError::BadRequest("No photo to ingest".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::DetectedLabel;
    use crate::document::PhotoHit;
    use crate::search_clients::tantivy::TantivySearcher;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeVision(Option<Vec<&'static str>>);

    #[async_trait]
    impl VisionLabeler for FakeVision {
        async fn detect_labels(
            &self,
            _bucket: &str,
            _object_key: &str,
            _max_labels: usize,
        ) -> Result<Vec<DetectedLabel>, AppError> {
            match &self.0 {
                Some(names) => Ok(names
                    .iter()
                    .map(|name| DetectedLabel {
                        name: name.to_string(),
                        confidence: 90.0,
                    })
                    .collect()),
                None => Err(AppError::Collaborator {
                    service: "vision",
                    detail: "unreachable".into(),
                }),
            }
        }
    }

    struct FakeMetadata(Option<&'static str>);

    #[async_trait]
    impl ObjectMetadataSource for FakeMetadata {
        async fn object_metadata(
            &self,
            _bucket: &str,
            _object_key: &str,
        ) -> Result<HashMap<String, String>, AppError> {
            let mut metadata = HashMap::new();
            if let Some(custom) = self.0 {
                metadata.insert(CUSTOM_LABELS_KEY.to_string(), custom.to_string());
            }
            Ok(metadata)
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        written: Mutex<Vec<PhotoDocument>>,
        fail: bool,
    }

    #[async_trait]
    impl PhotoIndex for RecordingIndex {
        async fn upsert_document(&self, document: &PhotoDocument) -> Result<(), AppError> {
            if self.fail {
                return Err(AppError::Generic("index unavailable".into()));
            }
            self.written.lock().unwrap().push(document.clone());
            Ok(())
        }

        async fn search_labels(&self, _keywords: &[String]) -> Result<Vec<PhotoHit>, AppError> {
            Ok(Vec::new())
        }
    }

    fn photo(key: &str) -> PhotoRef {
        PhotoRef {
            bucket: "photos".to_string(),
            object_key: key.to_string(),
        }
    }

    fn pipeline(
        vision: Option<Vec<&'static str>>,
        custom: Option<&'static str>,
        index: Arc<dyn PhotoIndex>,
    ) -> IngestionPipeline {
        IngestionPipeline::new(Arc::new(FakeVision(vision)), Arc::new(FakeMetadata(custom)), index)
    }

    #[tokio::test]
    async fn document_carries_merged_labels() {
        let index = Arc::new(RecordingIndex::default());
        let outcome = pipeline(Some(vec!["Cat", "Animal"]), Some("Cat, Pet"), index.clone())
            .ingest(&photo("cat.jpg"))
            .await
            .unwrap();

        assert_eq!(outcome.object_key, "cat.jpg");
        assert_eq!(outcome.message, "Photo indexed");
        let written = index.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        let labels: Vec<&str> = written[0].labels.iter().map(String::as_str).collect();
        assert_eq!(labels, vec!["animal", "cat", "pet"]);
        assert_eq!(written[0].bucket, "photos");
    }

    #[tokio::test]
    async fn vision_failure_writes_nothing() {
        let index = Arc::new(RecordingIndex::default());
        let result = pipeline(None, Some("pet"), index.clone())
            .ingest(&photo("cat.jpg"))
            .await;

        assert!(result.is_err());
        assert!(index.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn index_failure_is_an_ingestion_failure() {
        let index = Arc::new(RecordingIndex {
            fail: true,
            ..Default::default()
        });
        let result = pipeline(Some(vec!["cat"]), None, index).ingest(&photo("cat.jpg")).await;
        assert!(matches!(result, Err(AppError::Generic(_))));
    }

    #[tokio::test]
    async fn unlabeled_photo_is_still_indexed() {
        let index = Arc::new(RecordingIndex::default());
        pipeline(Some(vec![]), None, index.clone())
            .ingest(&photo("blank.jpg"))
            .await
            .unwrap();

        let written = index.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].labels.is_empty());
    }

    #[tokio::test]
    async fn reingesting_a_key_keeps_one_document() {
        let index = Arc::new(TantivySearcher::in_memory().unwrap());
        let pipeline = pipeline(Some(vec!["cat"]), Some("pet"), index.clone());

        pipeline.ingest(&photo("cat.jpg")).await.unwrap();
        pipeline.ingest(&photo("cat.jpg")).await.unwrap();

        let hits = index.search_labels(&["cat".to_string()]).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].labels, Some(vec!["cat".to_string(), "pet".to_string()]));
    }

    #[tokio::test]
    async fn ingest_all_stops_at_first_failure() {
        let index = Arc::new(RecordingIndex::default());
        let pipeline = pipeline(None, None, index.clone());
        assert!(pipeline.ingest_all(&[photo("a.jpg"), photo("b.jpg")]).await.is_err());
        assert!(matches!(
            pipeline.ingest_all(&[]).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn notification_records_become_photo_refs() {
        let request: IngestRequest = serde_json::from_value(json!({
            "Records": [
                { "eventName": "ObjectCreated:Put",
                  "s3": { "bucket": { "name": "photos" }, "object": { "key": "a.jpg", "size": 10 } } },
                { "s3": { "bucket": { "name": "photos" }, "object": { "key": "b.jpg" } } }
            ]
        }))
        .unwrap();

        assert_eq!(request.into_photos(), vec![photo("a.jpg"), photo("b.jpg")]);
    }

    #[test]
    fn bare_photo_reference_is_accepted() {
        let request: IngestRequest =
            serde_json::from_value(json!({ "bucket": "photos", "objectKey": "a.jpg" })).unwrap();
        assert_eq!(request.into_photos(), vec![photo("a.jpg")]);
    }
}
