//! Central-bank indicator series (SELIC, CDI, IPCA and friends).
//!
//! The upstream endpoint answers with an array of `{"data": "dd/mm/yyyy", "valor": "10.5"}`
//! objects. Mirrors and caches in front of it sometimes rename the fields to `date`/`value`,
//! send ISO dates or plain numbers, so parsing accepts all of those.

use super::{build_http_client, check_status};
use crate::{
    errors::{Error, Result},
    serde_helpers::parse_decimal,
};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

const SERVICE: &str = "central bank";
const UPSTREAM_DATE_FORMAT: &str = "%d/%m/%Y";

/// One observation of an indicator series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorPoint {
    /// Observation date
    pub date: NaiveDate,
    /// Observed value
    pub value: f64,
}

/// Client for the central-bank time-series API.
#[derive(Debug, Clone)]
pub struct CentralBankClient {
    client: reqwest::Client,
    base_url: String,
}

impl CentralBankClient {
    /// Creates a client for `base_url` (e.g. `https://api.bcb.gov.br/dados/serie`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches series `code` between `start` and `end`, inclusive, oldest first.
    #[instrument(skip(self))]
    pub async fn fetch_series(
        &self,
        code: u32,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<IndicatorPoint>> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(Error::validation(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }

        let url = format!("{}/bcdata.sgs.{code}/dados", self.base_url);
        let mut query = vec![("formato", "json".to_string())];
        if let Some(start) = start {
            query.push(("dataInicial", start.format(UPSTREAM_DATE_FORMAT).to_string()));
        }
        if let Some(end) = end {
            query.push(("dataFinal", end.format(UPSTREAM_DATE_FORMAT).to_string()));
        }

        let response = self.client.get(&url).query(&query).send().await?;
        let body: Value = check_status(SERVICE, response).await?.json().await?;
        let points = parse_series(&body)?;
        debug!(count = points.len(), "Fetched indicator series");
        Ok(points)
    }
}

/// Resolves a series name (`selic`, `cdi`, `ipca`, `igpm`) or a numeric code.
#[must_use]
pub fn series_code(name: &str) -> Option<u32> {
    match name.trim().to_lowercase().as_str() {
        "selic" => Some(432),
        "cdi" => Some(12),
        "ipca" => Some(433),
        "igpm" | "igp-m" => Some(189),
        other => other.parse().ok().filter(|code| *code > 0),
    }
}

/// Parses a date in `dd/mm/yyyy` or ISO `yyyy-mm-dd` form.
#[must_use]
pub fn parse_indicator_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, UPSTREAM_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

fn field<'a>(item: &'a Value, names: [&str; 2]) -> Option<&'a Value> {
    names.iter().find_map(|name| item.get(*name))
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// Parses a series response body, sorted by date.
///
/// Entries with a missing or unparsable value are skipped (the upstream publishes
/// blanks for days without an observation). A body that is not an array, or an entry
/// with an unreadable date, is an error.
pub fn parse_series(body: &Value) -> Result<Vec<IndicatorPoint>> {
    let items = body.as_array().ok_or_else(|| Error::Upstream {
        service: SERVICE,
        message: "expected a JSON array".to_string(),
    })?;

    let mut points = Vec::with_capacity(items.len());
    for item in items {
        let raw_date = field(item, ["data", "date"])
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Upstream {
                service: SERVICE,
                message: format!("entry without a date: {item}"),
            })?;
        let date = parse_indicator_date(raw_date).ok_or_else(|| Error::Upstream {
            service: SERVICE,
            message: format!("unreadable date {raw_date:?}"),
        })?;

        if let Some(value) = field(item, ["valor", "value"]).and_then(value_as_f64) {
            points.push(IndicatorPoint { date, value });
        }
    }

    points.sort_by_key(|p| p.date);
    Ok(points)
}
