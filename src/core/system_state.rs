//! Key-value bookkeeping in the `system_state` table.
//!
//! The scheduler records when each housekeeping job last ran here.

use crate::{
    entities::{SystemState, system_state},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    Set,
    prelude::*,
    sea_query::{OnConflict, SimpleExpr},
};

/// Date of the last completed recurring-transaction run (`YYYY-MM-DD`).
pub const LAST_RECURRING_RUN_KEY: &str = "last_recurring_run";
/// Instant of the last trial-expiry sweep (RFC 3339).
pub const LAST_TRIAL_SWEEP_KEY: &str = "last_trial_sweep";

/// Reads a raw value.
pub async fn get_value<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?;
    Ok(state.map(|s| s.value))
}

/// Inserts or overwrites a value in one statement.
pub async fn set_value<C>(db: &C, key: &str, value: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    upsert(db, key, value, None).await?;
    Ok(())
}

/// Stores `value` unless the current value sorts after it.
///
/// Returns whether the stored value changed. Used for keys whose values order
/// lexically by time (`YYYY-MM-DD`), so a back-dated run never rewinds them.
pub async fn advance_value<C>(db: &C, key: &str, value: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    let only_forward = Expr::col((SystemState, system_state::Column::Value))
        .lt(Expr::cust("excluded.value"));
    Ok(upsert(db, key, value, Some(only_forward)).await? > 0)
}

async fn upsert<C>(db: &C, key: &str, value: &str, condition: Option<SimpleExpr>) -> Result<u64>
where
    C: ConnectionTrait,
{
    let row = system_state::ActiveModel {
        key: Set(key.to_string()),
        value: Set(value.to_string()),
        updated_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    let on_conflict = OnConflict::column(system_state::Column::Key)
        .update_columns([system_state::Column::Value, system_state::Column::UpdatedAt])
        .action_and_where_option(condition)
        .to_owned();

    let affected = SystemState::insert(row)
        .on_conflict(on_conflict)
        .exec_without_returning(db)
        .await?;
    Ok(affected)
}

/// Date of the last recurring run, if one was recorded.
pub async fn last_recurring_run(db: &DatabaseConnection) -> Result<Option<NaiveDate>> {
    get_value(db, LAST_RECURRING_RUN_KEY)
        .await?
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| Error::Config {
                message: format!("Failed to parse last recurring run date: {e}"),
            })
        })
        .transpose()
}

/// Records `date` as the last recurring run unless a later date is already stored.
///
/// Returns whether the stored date moved.
pub async fn set_last_recurring_run(db: &DatabaseConnection, date: NaiveDate) -> Result<bool> {
    advance_value(db, LAST_RECURRING_RUN_KEY, &date.format("%Y-%m-%d").to_string()).await
}

/// Instant of the last trial sweep, if one was recorded.
pub async fn last_trial_sweep(db: &DatabaseConnection) -> Result<Option<DateTime<Utc>>> {
    get_value(db, LAST_TRIAL_SWEEP_KEY)
        .await?
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| Error::Config {
                    message: format!("Failed to parse last trial sweep time: {e}"),
                })
        })
        .transpose()
}

/// Records `at` as the last trial sweep.
pub async fn set_last_trial_sweep(db: &DatabaseConnection, at: DateTime<Utc>) -> Result<()> {
    set_value(db, LAST_TRIAL_SWEEP_KEY, &at.to_rfc3339()).await
}
