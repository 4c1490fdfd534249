use crate::collaborator_clients::slot_filling::HttpSlotFiller;
use crate::collaborators::SlotFiller;
use crate::config::AppConfig;
use crate::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;

/// Turns raw query text into lowercase keywords. Interpretation never fails:
/// every variant ends in whitespace tokenization when it has nothing better.
#[async_trait]
pub trait KeywordInterpreter: Send + Sync {
    async fn interpret(&self, raw_text: &str) -> Vec<String>;
}

pub fn tokenize(raw_text: &str) -> Vec<String> {
    raw_text
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

pub struct NaiveTokenizer;

#[async_trait]
impl KeywordInterpreter for NaiveTokenizer {
    async fn interpret(&self, raw_text: &str) -> Vec<String> {
        tokenize(raw_text)
    }
}

pub struct SlotFillingInterpreter {
    slot_filler: Arc<dyn SlotFiller>,
}

impl SlotFillingInterpreter {
    pub fn new(slot_filler: Arc<dyn SlotFiller>) -> Self {
        Self { slot_filler }
    }
}

#[async_trait]
impl KeywordInterpreter for SlotFillingInterpreter {
    async fn interpret(&self, raw_text: &str) -> Vec<String> {
        let slots = match self.slot_filler.recognize_text(raw_text).await {
            Ok(slots) => slots,
            Err(e) => {
                log::warn!("Slot filling failed: {}. Falling back to raw query.", e);
                return tokenize(raw_text);
            }
        };

        let keywords: Vec<String> = slots
            .into_iter()
            .filter_map(|slot| {
                log::trace!("Slot {}: {:?}", slot.name, slot.interpreted_value);
                slot.interpreted_value
            })
            .filter(|value| !value.trim().is_empty())
            .map(|value| value.to_lowercase())
            .collect();

        if keywords.is_empty() {
            log::warn!(
                "Slot filling returned no keywords for '{}'. Using raw query instead.",
                raw_text
            );
            return tokenize(raw_text);
        }

        log::debug!("Keywords from slot filling: {:?}", keywords);
        keywords
    }
}

/// Picks the interpreter once, from whether slot filling is configured.
pub fn interpreter_from_config(config: &AppConfig) -> Result<Arc<dyn KeywordInterpreter>, AppError> {
    match &config.slot_filling {
        Some(slot_config) => {
            log::info!("Interpreting queries with slot-filling bot {}", slot_config.bot_id);
            let slot_filler = HttpSlotFiller::new(slot_config)?;
            Ok(Arc::new(SlotFillingInterpreter::new(Arc::new(slot_filler))))
        }
        None => {
            log::info!("No slot-filling bot configured; tokenizing queries on whitespace");
            Ok(Arc::new(NaiveTokenizer))
        }
    }
}
