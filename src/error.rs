use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use elasticsearch::Error as ElasticsearchError;
use serde_json::Error as SerdeJsonError;
use tantivy::TantivyError;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Elasticsearch error: {0}")]
    Elasticsearch(#[from] ElasticsearchError),

    #[error("Elasticsearch client build error: {0}")]
    ElasticsearchBuild(#[from] elasticsearch::http::transport::BuildError),

    #[error("Tantivy error: {0}")]
    Tantivy(#[from] TantivyError),

    #[error("Tantivy directory error: {0}")]
    TantivyDirectory(#[from] tantivy::directory::error::OpenDirectoryError),

    #[error("JSON error: {0}")]
    Json(#[from] SerdeJsonError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Tokio join error: {0}")]
    Join(#[from] JoinError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{service} returned an unexpected response: {detail}")]
    Collaborator { service: &'static str, detail: String },

    #[error("Generic error: {0}")]
    Generic(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(("Access-Control-Allow-Origin", "*"))
            .json(serde_json::json!({
                "message": self.to_string(),
            }))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Io(_)
            | AppError::Json(_)
            | AppError::Config(_)
            | AppError::Elasticsearch(_)
            | AppError::ElasticsearchBuild(_)
            | AppError::Tantivy(_)
            | AppError::TantivyDirectory(_)
            | AppError::Http(_)
            | AppError::Url(_)
            | AppError::Join(_)
            | AppError::Collaborator { .. }
            | AppError::Generic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
