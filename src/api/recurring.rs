use super::{
    AppState,
    response::{ApiResult, json_body, ok, optional_json_body, query_params},
};
use crate::{
    core::recurring::{self, ProcessingReport},
    entities::recurring_transaction,
    errors::Error,
    scheduler,
};
use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub(super) struct ProcessRequest {
    /// Run as if today were this date
    #[serde(default)]
    date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProcessResponse {
    #[serde(flatten)]
    report: ProcessingReport,
    summary: String,
}

pub(super) async fn process_recurring(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<ProcessResponse> {
    let request: ProcessRequest = optional_json_body(&body)?;
    let today = request.date.unwrap_or_else(|| Utc::now().date_naive());
    let report = scheduler::run_recurring_job(&state.db, today).await?;
    let summary = recurring::format_processing_summary(&report);
    ok(ProcessResponse { report, summary })
}

#[derive(Debug, Deserialize)]
pub(super) struct ImportRequest {
    template: Value,
}

pub(super) async fn import_recurring(
    State(state): State<AppState>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> ApiResult<recurring_transaction::Model> {
    let request = json_body(payload)?;
    let created =
        recurring::import_template(&state.db, request.template, Utc::now().date_naive()).await?;
    ok(created)
}

#[derive(Debug, Deserialize)]
pub(super) struct UserQuery {
    user_id: String,
}

pub(super) async fn list_recurring(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Vec<recurring_transaction::Model>> {
    let query = query_params(query)?;
    ok(recurring::list_templates_for_user(&state.db, &query.user_id).await?)
}

#[derive(Debug, Deserialize)]
pub(super) struct ActiveRequest {
    user_id: String,
    is_active: bool,
}

pub(super) async fn set_recurring_active(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ActiveRequest>, JsonRejection>,
) -> ApiResult<recurring_transaction::Model> {
    let Path(id) = id.map_err(|rejection| Error::validation(rejection.body_text()))?;
    let request = json_body(payload)?;
    let updated =
        recurring::set_template_active(&state.db, &request.user_id, id, request.is_active).await?;
    ok(updated)
}
