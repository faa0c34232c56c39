use super::{
    AppState,
    response::{ApiResult, ok, query_params},
};
use crate::{
    errors::{Error, Result},
    market::{IndicatorPoint, Quote, central_bank, series_code},
};
use axum::extract::{
    Path, Query, State,
    rejection::{PathRejection, QueryRejection},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(super) struct RangeQuery {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SeriesResponse {
    series: String,
    code: u32,
    points: Vec<IndicatorPoint>,
}

fn parse_bound(raw: Option<&str>, name: &str) -> Result<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(text) => central_bank::parse_indicator_date(text)
            .map(Some)
            .ok_or_else(|| Error::validation(format!("{name} must be dd/mm/yyyy or yyyy-mm-dd"))),
    }
}

pub(super) async fn indicators(
    State(state): State<AppState>,
    series: std::result::Result<Path<String>, PathRejection>,
    query: std::result::Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<SeriesResponse> {
    let Path(series) = series.map_err(|rejection| Error::validation(rejection.body_text()))?;
    let query = query_params(query)?;
    let code = series_code(&series)
        .ok_or_else(|| Error::validation(format!("unknown indicator series {series:?}")))?;
    let start = parse_bound(query.start.as_deref(), "start")?;
    let end = parse_bound(query.end.as_deref(), "end")?;

    let points = state.central_bank.fetch_series(code, start, end).await?;
    ok(SeriesResponse {
        series,
        code,
        points,
    })
}

#[derive(Debug, Deserialize)]
pub(super) struct QuotesQuery {
    #[serde(default)]
    symbols: String,
}

pub(super) async fn quotes(
    State(state): State<AppState>,
    query: std::result::Result<Query<QuotesQuery>, QueryRejection>,
) -> ApiResult<Vec<Quote>> {
    let query = query_params(query)?;
    let symbols: Vec<String> = query.symbols.split(',').map(str::to_string).collect();
    ok(state.quotes.fetch_quotes(&symbols).await?)
}

#[cfg(test)]
mod tests {
    use super::parse_bound;
    use crate::api::tests::{call, get_request, test_state};
    use axum::http::StatusCode;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_bound() {
        assert_eq!(parse_bound(None, "start").ok(), Some(None));
        assert_eq!(parse_bound(Some(" "), "start").ok(), Some(None));
        assert_eq!(
            parse_bound(Some("01/02/2024"), "start").ok(),
            Some(NaiveDate::from_ymd_opt(2024, 2, 1))
        );
        assert!(parse_bound(Some("soon"), "end").is_err());
    }

    #[tokio::test]
    async fn test_indicator_input_validation() {
        let state = test_state().await;
        let (status, body) = call(&state, get_request("/functions/indicators/bitcoin")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) =
            call(&state, get_request("/functions/indicators/selic?start=yesterday")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_indicator_upstream_failure_is_bad_gateway() {
        // clients in the test state point at a closed local port
        let state = test_state().await;
        let (status, body) = call(&state, get_request("/functions/indicators/selic")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_quotes_requires_symbols() {
        let state = test_state().await;
        let (status, _) = call(&state, get_request("/functions/quotes")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(&state, get_request("/functions/quotes?symbols=,%20,")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
