use crate::collaborator_clients::{append_path, ensure_success};
use crate::collaborators::{DetectedLabel, VisionLabeler};
use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

const SERVICE: &str = "vision";

/// Talks to a label-detection endpoint that speaks the `DetectLabels`
/// request/response shape.
pub struct HttpVisionLabeler {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpVisionLabeler {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let endpoint = append_path(&Url::parse(base_url)?, ["detect-labels"])?;
        log::debug!("Vision endpoint: {}", endpoint);
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct DetectLabelsRequest<'a> {
    image: ImageRef<'a>,
    max_labels: usize,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct ImageRef<'a> {
    s3_object: S3ObjectRef<'a>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct S3ObjectRef<'a> {
    bucket: &'a str,
    name: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct DetectLabelsResponse {
    #[serde(default)]
    labels: Vec<WireLabel>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct WireLabel {
    name: String,
    #[serde(default)]
    confidence: f32,
}

fn parse_labels(body: serde_json::Value) -> Result<Vec<DetectedLabel>, AppError> {
    let response: DetectLabelsResponse = serde_json::from_value(body)?;
    Ok(response
        .labels
        .into_iter()
        .map(|l| DetectedLabel {
            name: l.name,
            confidence: l.confidence,
        })
        .collect())
}

#[async_trait]
impl VisionLabeler for HttpVisionLabeler {
    async fn detect_labels(
        &self,
        bucket: &str,
        object_key: &str,
        max_labels: usize,
    ) -> Result<Vec<DetectedLabel>, AppError> {
        let request = DetectLabelsRequest {
            image: ImageRef {
                s3_object: S3ObjectRef {
                    bucket,
                    name: object_key,
                },
            },
            max_labels,
        };
        log::debug!("Detecting labels for {}/{}", bucket, object_key);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;
        let body = ensure_success(SERVICE, response)
            .await?
            .json::<serde_json::Value>()
            .await?;
        log::trace!("Vision response for {}: {:?}", object_key, body);

        parse_labels(body)
    }
}
