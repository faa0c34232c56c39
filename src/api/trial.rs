use super::{
    AppState,
    response::{ApiResult, json_body, ok},
};
use crate::{
    core::trial::{self, TrialStatus},
    entities::profile,
    scheduler,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(super) struct StartTrialRequest {
    user_id: String,
    #[serde(default)]
    display_name: Option<String>,
}

pub(super) async fn start_trial(
    State(state): State<AppState>,
    payload: Result<Json<StartTrialRequest>, JsonRejection>,
) -> ApiResult<profile::Model> {
    let request = json_body(payload)?;
    let display_name = request
        .display_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| request.user_id.clone());
    let created = trial::start_trial(
        &state.db,
        &request.user_id,
        &display_name,
        state.config.trial.days,
        Utc::now(),
    )
    .await?;
    ok(created)
}

#[derive(Debug, Deserialize)]
pub(super) struct CheckTrialRequest {
    user_id: String,
}

pub(super) async fn check_trial(
    State(state): State<AppState>,
    payload: Result<Json<CheckTrialRequest>, JsonRejection>,
) -> ApiResult<TrialStatus> {
    let request = json_body(payload)?;
    ok(trial::check_trial(&state.db, &request.user_id, Utc::now()).await?)
}

#[derive(Debug, Serialize)]
pub(super) struct ExpireResponse {
    expired: u64,
}

pub(super) async fn expire_trials(State(state): State<AppState>) -> ApiResult<ExpireResponse> {
    let expired = scheduler::run_trial_sweep(&state.db, Utc::now()).await?;
    ok(ExpireResponse { expired })
}

#[cfg(test)]
mod tests {
    use crate::api::tests::{call, json_request, test_state};
    use crate::core::trial::start_trial;
    use crate::errors::Result;
    use axum::http::{Method, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn test_start_trial_uses_configured_length() {
        let state = test_state().await;
        let (status, body) = call(
            &state,
            json_request(Method::POST, "/functions/start-trial", &json!({"user_id": "u9"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["display_name"], "u9");
        assert_eq!(body["data"]["subscription_status"], "trial");

        let (status, _) = call(
            &state,
            json_request(Method::POST, "/functions/check-trial", &json!({"user_id": "u9"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // a second signup for the same user is rejected
        let (status, _) = call(
            &state,
            json_request(Method::POST, "/functions/start-trial", &json!({"user_id": "u9"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_check_trial() -> Result<()> {
        let state = test_state().await;
        start_trial(&state.db, "u1", "One", 7, Utc::now()).await?;

        let (status, body) = call(
            &state,
            json_request(Method::POST, "/functions/check-trial", &json!({"user_id": "u1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "trial");
        assert_eq!(body["data"]["days_remaining"], 7);
        assert_eq!(body["data"]["is_expired"], false);

        let (status, _) = call(
            &state,
            json_request(Method::POST, "/functions/check-trial", &json!({"user_id": "ghost"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_expire_trials() -> Result<()> {
        let state = test_state().await;
        start_trial(&state.db, "late", "Late", 7, Utc::now() - Duration::days(9)).await?;
        start_trial(&state.db, "new", "New", 7, Utc::now()).await?;

        let (status, body) =
            call(&state, json_request(Method::POST, "/functions/expire-trials", &json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["expired"], 1);
        Ok(())
    }
}
