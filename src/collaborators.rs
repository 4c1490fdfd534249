use crate::error::AppError;
use async_trait::async_trait;
use std::collections::HashMap;

/// One label detected by the vision service. Only `name` is used downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLabel {
    pub name: String,
    pub confidence: f32,
}

/// A named slot from the slot-filling service, in the order the service
/// reported it.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub name: String,
    pub interpreted_value: Option<String>,
}

#[async_trait]
pub trait VisionLabeler: Send + Sync {
    async fn detect_labels(
        &self,
        bucket: &str,
        object_key: &str,
        max_labels: usize,
    ) -> Result<Vec<DetectedLabel>, AppError>;
}

#[async_trait]
pub trait ObjectMetadataSource: Send + Sync {
    async fn object_metadata(
        &self,
        bucket: &str,
        object_key: &str,
    ) -> Result<HashMap<String, String>, AppError>;
}

#[async_trait]
pub trait SlotFiller: Send + Sync {
    async fn recognize_text(&self, text: &str) -> Result<Vec<Slot>, AppError>;
}
