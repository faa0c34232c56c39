//! Equity quotes from a brapi-style API.

use super::{build_http_client, check_status};
use crate::{
    errors::{Error, Result},
    serde_helpers::parse_decimal,
};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{instrument, warn};

const SERVICE: &str = "quote provider";
/// Environment variable holding the quote API token.
pub const QUOTE_TOKEN_ENV: &str = "QUOTE_API_TOKEN";
const MAX_SYMBOLS: usize = 20;

/// Latest price of one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    /// Ticker symbol
    pub symbol: String,
    /// Last traded price
    pub price: f64,
    /// Change since previous close, in percent
    pub change_percent: Option<f64>,
}

/// Client for the quote API.
#[derive(Debug, Clone)]
pub struct QuoteClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl QuoteClient {
    /// Creates a client for `base_url`. The token is optional; free tiers accept a few
    /// symbols without one.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Like [`QuoteClient::new`], reading the token from `QUOTE_API_TOKEN`.
    pub fn from_env(base_url: &str, timeout: Duration) -> Result<Self> {
        Self::new(base_url, std::env::var(QUOTE_TOKEN_ENV).ok(), timeout)
    }

    /// Fetches quotes for `symbols` in a single request.
    #[instrument(skip(self))]
    pub async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>> {
        let symbols = normalize_symbols(symbols)?;
        let url = format!("{}/quote/{}", self.base_url, symbols.join(","));

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.query(&[("token", token)]);
        }

        let response = request.send().await?;
        let body: Value = check_status(SERVICE, response).await?.json().await?;
        parse_quotes(&body)
    }
}

/// Upper-cases, trims and de-duplicates symbols, rejecting an empty or oversized list.
pub fn normalize_symbols(symbols: &[String]) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::new();
    for symbol in symbols {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            continue;
        }
        if !symbol.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^')) {
            return Err(Error::validation(format!("invalid symbol {symbol:?}")));
        }
        if !normalized.contains(&symbol) {
            normalized.push(symbol);
        }
    }
    if normalized.is_empty() {
        return Err(Error::validation("at least one symbol is required"));
    }
    if normalized.len() > MAX_SYMBOLS {
        return Err(Error::validation(format!(
            "at most {MAX_SYMBOLS} symbols per request"
        )));
    }
    Ok(normalized)
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// Parses a quote response (`{"results": [{"symbol", "regularMarketPrice", ...}]}`).
///
/// Results without a symbol or price are dropped with a warning.
pub fn parse_quotes(body: &Value) -> Result<Vec<Quote>> {
    let results = body
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Upstream {
            service: SERVICE,
            message: body
                .get("message")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .unwrap_or("response has no results")
                .to_string(),
        })?;

    let mut quotes = Vec::with_capacity(results.len());
    for item in results {
        let symbol = item.get("symbol").and_then(Value::as_str);
        let price = number(item.get("regularMarketPrice")).or_else(|| number(item.get("price")));
        match (symbol, price) {
            (Some(symbol), Some(price)) => quotes.push(Quote {
                symbol: symbol.to_string(),
                price,
                change_percent: number(item.get("regularMarketChangePercent"))
                    .or_else(|| number(item.get("changePercent"))),
            }),
            _ => warn!(%item, "Skipping quote without symbol or price"),
        }
    }
    Ok(quotes)
}
