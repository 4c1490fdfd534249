use crate::error::AppError;
use crate::ingest::{IngestRequest, IngestionPipeline};
use crate::query::QueryPipeline;
use actix_web::{error, web, App, HttpRequest, HttpResponse, HttpServer};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize, Debug)]
pub struct SearchParams {
    q: Option<String>,
}

async fn search_photos(
    pipeline: web::Data<QueryPipeline>,
    params: web::Query<SearchParams>,
) -> Result<HttpResponse, AppError> {
    log::debug!("Received search request: {:?}", params);
    let response = pipeline.search(params.q.as_deref()).await?;

    Ok(HttpResponse::Ok()
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .json(response))
}

async fn ingest_photo(
    pipeline: web::Data<IngestionPipeline>,
    request: web::Json<IngestRequest>,
) -> Result<HttpResponse, AppError> {
    let photos = request.into_inner().into_photos();
    log::debug!("Received ingestion request for {} photo(s)", photos.len());
    let outcome = pipeline.ingest_all(&photos).await?;

    Ok(HttpResponse::Ok()
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .json(outcome))
}

fn bad_json(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected ingestion body: {}", err);
    AppError::BadRequest(format!("Invalid request body: {}", err)).into()
}

fn bad_query(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected query string: {}", err);
    AppError::BadRequest(format!("Invalid query string: {}", err)).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(bad_json))
        .app_data(web::QueryConfig::default().error_handler(bad_query))
        .service(web::resource("/search").route(web::get().to(search_photos)))
        .service(web::resource("/ingest").route(web::post().to(ingest_photo)));
}

pub async fn start_web_server(
    port: u16,
    query_pipeline: Arc<QueryPipeline>,
    ingestion_pipeline: Arc<IngestionPipeline>,
) -> std::io::Result<()> {
    let query_data = web::Data::from(query_pipeline);
    let ingestion_data = web::Data::from(ingestion_pipeline);

    log::info!("Starting web server on port: {}", port);

    HttpServer::new(move || {
        App::new()
            .app_data(query_data.clone())
            .app_data(ingestion_data.clone())
            .configure(configure)
    })
    .bind(format!("0.0.0.0:{}", port))?
    .run()
    .await
}
