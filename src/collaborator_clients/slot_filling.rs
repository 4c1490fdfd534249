use crate::collaborator_clients::{append_path, ensure_success};
use crate::collaborators::{Slot, SlotFiller};
use crate::config::SlotFillingConfig;
use crate::error::AppError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

const SERVICE: &str = "slot filling";

/// Client for a conversational bot runtime exposing `RecognizeText`.
pub struct HttpSlotFiller {
    client: reqwest::Client,
    endpoint: Url,
    bot_id: String,
    bot_alias_id: String,
    locale_id: String,
}

impl HttpSlotFiller {
    pub fn new(config: &SlotFillingConfig) -> Result<Self, AppError> {
        let endpoint = append_path(&Url::parse(&config.url)?, ["recognize-text"])?;
        log::debug!("Slot-filling endpoint: {} (bot {})", endpoint, config.bot_id);
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            bot_id: config.bot_id.clone(),
            bot_alias_id: config.bot_alias_id.clone(),
            locale_id: config.locale_id.clone(),
        })
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RecognizeTextRequest<'a> {
    bot_id: &'a str,
    bot_alias_id: &'a str,
    locale_id: &'a str,
    session_id: String,
    text: &'a str,
}

/// Reads `sessionState.intent.slots` in the order the bot returned them.
/// A response without an intent carries no slots.
fn parse_slots(body: &Value) -> Result<Vec<Slot>, AppError> {
    let slots = match body.pointer("/sessionState/intent/slots") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(slots)) => slots,
        Some(other) => {
            return Err(AppError::Collaborator {
                service: SERVICE,
                detail: format!("slots is not an object: {}", other),
            })
        }
    };

    Ok(slots
        .iter()
        .map(|(name, details)| Slot {
            name: name.clone(),
            interpreted_value: details
                .pointer("/value/interpretedValue")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
        .collect())
}

#[async_trait]
impl SlotFiller for HttpSlotFiller {
    async fn recognize_text(&self, text: &str) -> Result<Vec<Slot>, AppError> {
        let request = RecognizeTextRequest {
            bot_id: &self.bot_id,
            bot_alias_id: &self.bot_alias_id,
            locale_id: &self.locale_id,
            session_id: Uuid::new_v4().to_string(),
            text,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;
        let body = ensure_success(SERVICE, response)
            .await?
            .json::<Value>()
            .await?;
        log::trace!("Slot-filling response: {:?}", body);

        parse_slots(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator_clients::stub;
    use actix_web::{web, HttpResponse};
    use serde_json::json;

    #[test]
    fn slots_keep_response_order() {
        let body = json!({
            "sessionState": { "intent": { "name": "SearchIntent", "slots": {
                "KeywordTwo": { "value": { "originalValue": "dogs", "interpretedValue": "Dogs" } },
                "KeywordOne": { "value": { "originalValue": "cats", "interpretedValue": "cats" } },
                "KeywordThree": null
            } } }
        });

        let slots = parse_slots(&body).unwrap();
        let names: Vec<&str> = slots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["KeywordTwo", "KeywordOne", "KeywordThree"]);
        assert_eq!(slots[0].interpreted_value.as_deref(), Some("Dogs"));
        assert_eq!(slots[2].interpreted_value, None);
    }

    #[test]
    fn no_intent_means_no_slots() {
        assert!(parse_slots(&json!({ "messages": [] })).unwrap().is_empty());
    }

    #[test]
    fn malformed_slots_is_an_error() {
        let body = json!({ "sessionState": { "intent": { "slots": ["cats"] } } });
        assert!(parse_slots(&body).is_err());
    }

    #[test]
    fn request_uses_camel_case() {
        let request = RecognizeTextRequest {
            bot_id: "bot",
            bot_alias_id: "alias",
            locale_id: "en_US",
            session_id: "s-1".into(),
            text: "show me cats",
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["botAliasId"], "alias");
        assert_eq!(value["localeId"], "en_US");
        assert_eq!(value["sessionId"], "s-1");
    }

    fn bot_config(url: String) -> SlotFillingConfig {
        SlotFillingConfig {
            url,
            bot_id: "bot".to_string(),
            bot_alias_id: "alias".to_string(),
            locale_id: "en_US".to_string(),
        }
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let filler = HttpSlotFiller::new(&bot_config("http://lex.local/v2/bot".into())).unwrap();
        assert_eq!(filler.endpoint.as_str(), "http://lex.local/v2/bot/recognize-text");
    }

    fn bot_routes(cfg: &mut web::ServiceConfig) {
        cfg.route(
            "/v2/bot/recognize-text",
            web::post().to(|body: web::Json<Value>| async move {
                let value = body["text"].as_str().unwrap_or("").to_string();
                HttpResponse::Ok().json(json!({
                    "sessionState": { "intent": { "slots": {
                        "Keyword": { "value": { "interpretedValue": value } }
                    } } }
                }))
            }),
        )
        .route(
            "/broken/recognize-text",
            web::post().to(|| async { HttpResponse::InternalServerError().finish() }),
        );
    }

    #[actix_web::test]
    async fn recognizes_text_over_http() {
        let base = stub::serve(bot_routes).await;
        let filler = HttpSlotFiller::new(&bot_config(format!("{}/v2/bot", base))).unwrap();

        let slots = filler.recognize_text("cats").await.unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].name, "Keyword");
        assert_eq!(slots[0].interpreted_value.as_deref(), Some("cats"));
    }

    #[actix_web::test]
    async fn non_success_status_is_a_collaborator_error() {
        let base = stub::serve(bot_routes).await;
        let filler = HttpSlotFiller::new(&bot_config(format!("{}/broken", base))).unwrap();

        assert!(matches!(
            filler.recognize_text("cats").await,
            Err(AppError::Collaborator { service: "slot filling", .. })
        ));
    }
}
