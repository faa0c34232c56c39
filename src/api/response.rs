//! The `{ success, data, error }` envelope every handler answers with.

use crate::errors::{Error, Result};
use axum::{
    Json,
    body::Bytes,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::error;

/// Uniform response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded
    pub success: bool,
    /// Payload on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What handlers return.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>>;

/// Wraps `data` in a successful envelope.
#[allow(clippy::unnecessary_wraps)]
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        data: Some(data),
        error: None,
    }))
}

impl Error {
    /// HTTP status a handler answers with for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. }
            | Self::InvalidAmount { .. }
            | Self::DateOutOfRange { .. }
            | Self::Json(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Upstream { .. } | Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Config { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

/// Unwraps a JSON body, turning axum's rejection into a validation error.
pub fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| Error::validation(rejection.body_text()))
}

/// Unwraps a query string, turning axum's rejection into a validation error.
pub fn query_params<T>(
    query: std::result::Result<axum::extract::Query<T>, QueryRejection>,
) -> Result<T> {
    query
        .map(|axum::extract::Query(value)| value)
        .map_err(|rejection| Error::validation(rejection.body_text()))
}

/// Parses an optional JSON body: an empty body yields `T::default()`.
pub fn optional_json_body<T>(bytes: &Bytes) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes).map_err(|e| Error::validation(format!("Invalid JSON body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Body {
        date: Option<String>,
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::not_found("trade", 1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::Upstream { service: "s", message: "m".to_string() }.status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            Error::Database(sea_orm::DbErr::Custom("x".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_optional_json_body() -> Result<()> {
        assert_eq!(optional_json_body::<Body>(&Bytes::new())?, Body::default());
        assert_eq!(optional_json_body::<Body>(&Bytes::from_static(b" \n"))?, Body::default());
        let parsed: Body = optional_json_body(&Bytes::from_static(br#"{"date":"2024-01-31"}"#))?;
        assert_eq!(parsed.date.as_deref(), Some("2024-01-31"));
        assert!(optional_json_body::<Body>(&Bytes::from_static(b"{oops")).is_err());
        Ok(())
    }
}
