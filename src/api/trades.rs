use super::{
    AppState,
    response::{ApiResult, json_body, ok},
};
use crate::{
    core::trades::{self, ClassificationReport},
    errors::Error,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(super) struct BulkDeleteRequest {
    user_id: String,
    strategy: String,
}

#[derive(Debug, Serialize)]
pub(super) struct BulkDeleteResponse {
    deleted: u64,
}

pub(super) async fn bulk_delete_trades(
    State(state): State<AppState>,
    payload: Result<Json<BulkDeleteRequest>, JsonRejection>,
) -> ApiResult<BulkDeleteResponse> {
    let request = json_body(payload)?;
    let deleted =
        trades::delete_trades_by_strategy(&state.db, &request.user_id, &request.strategy).await?;
    ok(BulkDeleteResponse { deleted })
}

#[derive(Debug, Deserialize)]
pub(super) struct ClassifyRequest {
    user_id: String,
}

pub(super) async fn classify_trades(
    State(state): State<AppState>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> ApiResult<ClassificationReport> {
    let request = json_body(payload)?;
    if !state.ai.is_configured() {
        return Err(Error::Config {
            message: "AI classification is not configured".to_string(),
        });
    }
    let report = trades::classify_trades(
        &state.db,
        &state.ai,
        &request.user_id,
        state.config.ai.classification_delay(),
    )
    .await?;
    ok(report)
}

#[cfg(test)]
mod tests {
    use crate::api::tests::{call, json_request, test_state};
    use crate::core::trades::list_trades;
    use crate::errors::Result;
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_bulk_delete_trades() -> Result<()> {
        let state = test_state().await;
        let t = reference_time();
        create_test_trade(&state.db, "u1", "AAPL", Some("Scalp"), Some(1.0), t).await?;
        create_test_trade(&state.db, "u1", "MSFT", Some("Scalp"), Some(2.0), t).await?;
        create_test_trade(&state.db, "u1", "NVDA", Some("Swing"), Some(3.0), t).await?;

        let (status, body) = call(
            &state,
            json_request(
                Method::POST,
                "/functions/bulk-delete-trades",
                &json!({"user_id": "u1", "strategy": "Scalp"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "data": {"deleted": 2}}));
        assert_eq!(list_trades(&state.db, "u1").await?.len(), 1);

        let (status, body) = call(
            &state,
            json_request(Method::POST, "/functions/bulk-delete-trades", &json!({"user_id": "u1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        Ok(())
    }

    #[tokio::test]
    async fn test_classify_trades_requires_ai_key() {
        let state = test_state().await;
        let (status, body) = call(
            &state,
            json_request(Method::POST, "/functions/classify-trades", &json!({"user_id": "u1"})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
    }
}
