// src/document.rs

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unique, lowercase labels attached to a photo.
pub type LabelSet = BTreeSet<String>;

/// The unit of indexing. `object_key` doubles as the index document id, so
/// indexing the same key again replaces the earlier document.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoDocument {
    pub object_key: String,
    pub bucket: String,
    pub created_timestamp: String,
    pub labels: LabelSet,
}

impl PhotoDocument {
    /// Builds a document stamped with the current UTC time.
    pub fn new(bucket: &str, object_key: &str, labels: LabelSet) -> Self {
        Self {
            object_key: object_key.to_string(),
            bucket: bucket.to_string(),
            created_timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            labels,
        }
    }
}

/// A document as returned by the index; only the projected fields.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoHit {
    pub object_key: String,
    pub bucket: String,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

/// Public search result shape.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SearchResult {
    pub url: String,
    pub labels: LabelSet,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}
