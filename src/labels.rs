use crate::collaborators::VisionLabeler;
use crate::document::LabelSet;
use crate::error::AppError;

/// Upper bound on labels requested from the vision service per image.
pub const MAX_LABELS: usize = 50;

/// Object metadata entry holding caller-supplied, comma-separated labels.
pub const CUSTOM_LABELS_KEY: &str = "customlabels";

/// Asks the vision service for labels and lowercases them. Confidence is
/// not filtered on. Any vision failure fails the whole ingestion event.
pub async fn extract_labels(
    vision: &dyn VisionLabeler,
    bucket: &str,
    object_key: &str,
) -> Result<LabelSet, AppError> {
    let detected = vision.detect_labels(bucket, object_key, MAX_LABELS).await?;
    log::debug!("Vision returned {} labels for {}", detected.len(), object_key);
    Ok(detected
        .into_iter()
        .map(|label| {
            log::trace!("{} ({:.1})", label.name, label.confidence);
            label.name.to_lowercase()
        })
        .collect())
}

pub fn parse_custom_labels(raw: Option<&str>) -> LabelSet {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

pub fn merge_labels(vision: LabelSet, custom: LabelSet) -> LabelSet {
    let mut merged = vision;
    merged.extend(custom);
    merged
}
