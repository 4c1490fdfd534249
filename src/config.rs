use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub engine: String,
    pub elasticsearch_url: String,
    pub index_name: String,
    pub tantivy_index_path: String,
    pub region: String,
    pub web_port: u16,
    pub log_level: String,
    pub vision_url: String,
    pub object_store_url: String,
    #[serde(default)]
    pub slot_filling: Option<SlotFillingConfig>,
}

/// Connection details for the slot-filling bot. When the whole table is
/// missing, queries are tokenized locally.
#[derive(Debug, Deserialize, Clone)]
pub struct SlotFillingConfig {
    pub url: String,
    pub bot_id: String,
    pub bot_alias_id: String,
    #[serde(default = "default_locale")]
    pub locale_id: String,
}

fn default_locale() -> String {
    "en_US".to_string()
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("PHOTO_SEARCH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        s.try_deserialize()
    }
}
