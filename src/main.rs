mod collaborator_clients;
mod collaborators;
mod config;
mod document;
mod error;
mod ingest;
mod keywords;
mod labels;
mod query;
mod search;
mod search_clients;
mod web_server;

use crate::collaborator_clients::{object_store::HttpObjectStore, vision::HttpVisionLabeler};
use crate::config::AppConfig;
use crate::ingest::{IngestionPipeline, PhotoRef};
use crate::keywords::interpreter_from_config;
use crate::query::QueryPipeline;
use crate::search::PhotoIndex;
use crate::search_clients::{elasticsearch::ElasticsearchSearcher, tantivy::TantivySearcher};
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "photo-search", about = "Label-based photo indexing and search")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the search and ingestion HTTP API
    Serve,
    /// Index one stored photo
    Ingest {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
    },
    /// Run a search and print the JSON response
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
}

fn build_index(config: &AppConfig) -> Result<Arc<dyn PhotoIndex>> {
    let index: Arc<dyn PhotoIndex> = if config.engine == "elasticsearch" {
        Arc::new(ElasticsearchSearcher::new(config)?)
    } else {
        Arc::new(TantivySearcher::new(config)?)
    };
    Ok(index)
}

fn build_ingestion(config: &AppConfig, index: Arc<dyn PhotoIndex>) -> Result<IngestionPipeline> {
    Ok(IngestionPipeline::new(
        Arc::new(HttpVisionLabeler::new(&config.vision_url)?),
        Arc::new(HttpObjectStore::new(&config.object_store_url)?),
        index,
    ))
}

fn build_query(config: &AppConfig, index: Arc<dyn PhotoIndex>) -> Result<QueryPipeline> {
    Ok(QueryPipeline::new(
        interpreter_from_config(config)?,
        index,
        &config.region,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::new()?;

    env_logger::Builder::new()
        .filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    info!("Starting photo-search with the {} index", config.engine);
    let index = build_index(&config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let query = build_query(&config, index.clone())?;
            let ingestion = build_ingestion(&config, index)?;
            if let Err(e) =
                web_server::start_web_server(config.web_port, Arc::new(query), Arc::new(ingestion)).await
            {
                log::error!("Web server error: {}", e);
            }
        }
        Command::Ingest { bucket, key } => {
            let photo = PhotoRef {
                bucket,
                object_key: key,
            };
            let outcome = build_ingestion(&config, index)?.ingest(&photo).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Search { query } => {
            let text = query.join(" ");
            let response = build_query(&config, index)?.search(Some(&text)).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    info!("photo-search finished");
    Ok(())
}
