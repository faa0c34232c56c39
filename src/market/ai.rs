//! AI chat-completion gateway.
//!
//! The gateway speaks the OpenAI chat-completions protocol. Models are asked to answer
//! with a JSON array, but replies regularly wrap it in prose or Markdown code fences, so
//! [`extract_json_array`] scans the text for the first array that parses.

use super::{build_http_client, check_status};
use crate::{
    core::trades::TradeClassifier,
    entities::trade,
    errors::{Error, Result},
};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument};

const SERVICE: &str = "AI gateway";
/// Environment variable holding the gateway API key.
pub const AI_KEY_ENV: &str = "AI_GATEWAY_API_KEY";
const MAX_LABELS: usize = 5;

const CLASSIFY_PROMPT: &str = "You label trades in a trading journal. \
Reply with a JSON array of up to five short lowercase tags describing the setup, \
for example [\"breakout\", \"earnings\", \"momentum\"]. Reply with the array only.";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

/// Client for the chat-completion gateway.
#[derive(Debug, Clone)]
pub struct AiGateway {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl AiGateway {
    /// Creates a client posting to `url` with `model`.
    pub fn new(url: &str, model: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            url: url.to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Like [`AiGateway::new`], reading the key from `AI_GATEWAY_API_KEY`.
    pub fn from_env(url: &str, model: &str, timeout: Duration) -> Result<Self> {
        Self::new(url, model, std::env::var(AI_KEY_ENV).ok(), timeout)
    }

    /// Whether an API key is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends one system + user exchange and returns the reply text.
    #[instrument(skip_all)]
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| Error::Config {
            message: format!("{AI_KEY_ENV} is not set"),
        })?;

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let reply: Value = check_status(SERVICE, response).await?.json().await?;
        reply_text(&reply)
    }
}

/// Pulls `choices[0].message.content` out of a chat-completion response.
pub fn reply_text(reply: &Value) -> Result<String> {
    reply
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::Upstream {
            service: SERVICE,
            message: "reply has no message content".to_string(),
        })
}

/// Returns the first JSON array embedded in `text`, if any.
///
/// Every `[` is tried as the start of a JSON value; the first one that parses as an
/// array wins. Trailing text after the array is ignored.
#[must_use]
pub fn extract_json_array(text: &str) -> Option<Vec<Value>> {
    text.match_indices('[').find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Array(items))) => Some(items),
            _ => None,
        }
    })
}

/// Turns a model reply into cleaned labels: strings only, trimmed, lower-cased,
/// de-duplicated and capped at five.
pub fn labels_from_reply(text: &str) -> Result<Vec<String>> {
    let items = extract_json_array(text).ok_or_else(|| Error::Upstream {
        service: SERVICE,
        message: "reply contains no JSON array".to_string(),
    })?;

    let mut labels: Vec<String> = Vec::new();
    for item in items {
        let Some(label) = item.as_str() else { continue };
        let label = label.trim().to_lowercase();
        if !label.is_empty() && !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels.truncate(MAX_LABELS);
    Ok(labels)
}

fn describe_trade(trade: &trade::Model) -> String {
    let mut text = format!(
        "Symbol: {}\nSide: {:?}\nEntry: {}\nQuantity: {}",
        trade.symbol, trade.side, trade.entry_price, trade.quantity
    );
    if let Some(exit) = trade.exit_price {
        text.push_str(&format!("\nExit: {exit}"));
    }
    if let Some(pnl) = trade.pnl {
        text.push_str(&format!("\nPnL: {pnl:.2}"));
    }
    if let Some(strategy) = &trade.strategy {
        text.push_str(&format!("\nStrategy: {strategy}"));
    }
    if let Some(notes) = &trade.notes {
        text.push_str(&format!("\nNotes: {notes}"));
    }
    text
}

impl TradeClassifier for AiGateway {
    fn classify(&self, trade: &trade::Model) -> impl Future<Output = Result<Vec<String>>> + Send {
        let description = describe_trade(trade);
        async move {
            let reply = self.complete(CLASSIFY_PROMPT, &description).await?;
            debug!(reply_len = reply.len(), "Classification reply received");
            labels_from_reply(&reply)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{entities::TradeSide, test_utils::reference_time};
    use serde_json::json;

    #[test]
    fn test_extract_plain_array() {
        assert_eq!(
            extract_json_array(r#"["a", "b"]"#),
            Some(vec![json!("a"), json!("b")])
        );
    }

    #[test]
    fn test_extract_from_fenced_reply() {
        let reply = "Sure! Here are the tags:\n```json\n[\"Breakout\", \"gap-up\"]\n```\nLet me know.";
        assert_eq!(
            extract_json_array(reply),
            Some(vec![json!("Breakout"), json!("gap-up")])
        );
    }

    #[test]
    fn test_extract_skips_brackets_that_are_not_json() {
        let reply = "Tags [see below]: [\"swing\"] and [\"ignored\"]";
        assert_eq!(extract_json_array(reply), Some(vec![json!("swing")]));
        assert_eq!(extract_json_array("no array here"), None);
        assert_eq!(extract_json_array("[unterminated"), None);
    }

    #[test]
    fn test_labels_from_reply() -> Result<()> {
        let labels = labels_from_reply(r#"[" Momentum ", "momentum", 3, "", "a", "b", "c", "d", "e"]"#)?;
        assert_eq!(labels, vec!["momentum", "a", "b", "c", "d"]);
        assert!(labels_from_reply("I cannot help with that").is_err());
        Ok(())
    }

    #[test]
    fn test_reply_text() {
        let reply = json!({"choices": [{"message": {"role": "assistant", "content": "[\"x\"]"}}]});
        assert_eq!(reply_text(&reply).unwrap(), "[\"x\"]");
        assert!(reply_text(&json!({"choices": []})).is_err());
    }

    #[tokio::test]
    async fn test_classify_without_key_is_config_error() -> Result<()> {
        let gateway = AiGateway::new("http://127.0.0.1:9", "m", None, Duration::from_secs(1))?;
        assert!(!gateway.is_configured());

        let trade = trade::Model {
            id: 1,
            user_id: "u1".to_string(),
            symbol: "AAPL".to_string(),
            side: TradeSide::Long,
            strategy: Some("Breakout".to_string()),
            entry_price: 100.0,
            exit_price: Some(110.0),
            quantity: 2.0,
            pnl: Some(20.0),
            notes: None,
            ai_tags: None,
            traded_at: reference_time(),
        };
        let description = describe_trade(&trade);
        assert!(description.contains("Strategy: Breakout"));
        assert!(description.contains("PnL: 20.00"));

        let result = gateway.classify(&trade).await;
        assert!(matches!(result, Err(Error::Config { .. })));
        Ok(())
    }
}
