//! Thin async clients for the third-party services the backend proxies.
//!
//! Each client owns a `reqwest::Client` with a request timeout and exposes one or two
//! calls. Response bodies are parsed by free functions so the parsing can be tested
//! without a network.

/// AI chat-completion gateway and JSON extraction from free text
pub mod ai;
/// Central-bank indicator time series
pub mod central_bank;
/// Equity quotes
pub mod quotes;

pub use ai::{AiGateway, extract_json_array};
pub use central_bank::{CentralBankClient, IndicatorPoint, series_code};
pub use quotes::{Quote, QuoteClient};

use crate::errors::{Error, Result};
use std::time::Duration;

pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(Error::from)
}

/// Turns a non-2xx response into [`Error::Upstream`], keeping the start of the body.
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    Err(Error::Upstream {
        service,
        message: format!("HTTP {status}: {snippet}"),
    })
}
