pub mod object_store;
pub mod slot_filling;
pub mod vision;

use crate::error::AppError;
use url::Url;

/// Appends path segments to `base`, keeping any prefix it already has
/// whether or not it ends in a slash.
pub(crate) fn append_path<'a>(
    base: &Url,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<Url, AppError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| AppError::Generic(format!("URL cannot be a base: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turns a non-success status into a collaborator error, keeping the body
/// for the log line.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Collaborator {
        service,
        detail: format!("status {}: {}", status, body),
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_prefix_without_trailing_slash() {
        let base = Url::parse("http://vision.local/api").unwrap();
        assert_eq!(
            append_path(&base, ["detect-labels"]).unwrap().as_str(),
            "http://vision.local/api/detect-labels"
        );
    }

    #[test]
    fn append_keeps_prefix_with_trailing_slash() {
        let base = Url::parse("http://lex.local/v2/bot/").unwrap();
        assert_eq!(
            append_path(&base, ["recognize-text"]).unwrap().as_str(),
            "http://lex.local/v2/bot/recognize-text"
        );
    }

    #[test]
    fn append_to_bare_host() {
        let base = Url::parse("http://localhost:9000").unwrap();
        assert_eq!(
            append_path(&base, ["photos", "a.jpg"]).unwrap().as_str(),
            "http://localhost:9000/photos/a.jpg"
        );
    }

    #[test]
    fn opaque_urls_are_rejected() {
        let base = Url::parse("mailto:someone@example.com").unwrap();
        assert!(append_path(&base, ["x"]).is_err());
    }
}
