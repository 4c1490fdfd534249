use crate::collaborator_clients::{append_path, ensure_success};
use crate::collaborators::ObjectMetadataSource;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::collections::HashMap;
use url::Url;

const SERVICE: &str = "object store";
const USER_METADATA_PREFIX: &str = "x-amz-meta-";

/// Reads user metadata from an S3-compatible object store with a path-style
/// `HEAD` request.
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpObjectStore {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)?;
        append_path(&base_url, std::iter::empty())?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    fn object_url(&self, bucket: &str, object_key: &str) -> Result<Url, AppError> {
        append_path(
            &self.base_url,
            std::iter::once(bucket).chain(object_key.split('/')),
        )
    }
}

/// User metadata keys with the `x-amz-meta-` prefix stripped.
fn user_metadata(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let key = name.as_str().strip_prefix(USER_METADATA_PREFIX)?;
            let value = value.to_str().ok()?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

#[async_trait]
impl ObjectMetadataSource for HttpObjectStore {
    async fn object_metadata(
        &self,
        bucket: &str,
        object_key: &str,
    ) -> Result<HashMap<String, String>, AppError> {
        let url = self.object_url(bucket, object_key)?;
        log::debug!("Fetching object metadata from {}", url);

        let response = self.client.head(url).send().await?;
        let response = ensure_success(SERVICE, response).await?;
        let metadata = user_metadata(response.headers());
        log::trace!("Metadata for {}/{}: {:?}", bucket, object_key, metadata);
        Ok(metadata)
    }
}
