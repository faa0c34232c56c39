//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test rows with sensible defaults.

use crate::{
    core::{
        recurring::{self, TemplateInput},
        social,
        trades::{self, NewTrade},
        transaction::NewTransaction,
    },
    entities::{
        Frequency, TradeSide, TransactionKind, post, recurring_transaction, trade,
    },
    errors::Result,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Fixed reference date used where a test does not care about "today".
///
/// # Panics
/// Never; the date is a valid constant.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Fixed reference instant (2024-01-01T00:00:00Z) for time-sensitive tests.
///
/// # Panics
/// Never; the instant is a valid constant.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Builds a template input with sensible defaults.
///
/// # Defaults
/// * `kind`: expense
/// * `category`: "Housing"
/// * `next_execution_date`: 2024-01-01
/// * no anchor, no end date, active
#[must_use]
pub fn template_input(user_id: &str, title: &str, amount: f64, frequency: Frequency) -> TemplateInput {
    TemplateInput {
        user_id: user_id.to_string(),
        title: title.to_string(),
        amount,
        kind: TransactionKind::Expense,
        category: "Housing".to_string(),
        account_id: None,
        description: None,
        tags: None,
        frequency,
        day_of_month: None,
        next_execution_date: Some(reference_date()),
        end_date: None,
        is_active: true,
    }
}

/// Creates a validated template whose first execution is `next_execution_date`.
pub async fn create_test_template(
    db: &DatabaseConnection,
    user_id: &str,
    title: &str,
    amount: f64,
    frequency: Frequency,
    next_execution_date: NaiveDate,
) -> Result<recurring_transaction::Model> {
    let mut input = template_input(user_id, title, amount, frequency);
    input.next_execution_date = Some(next_execution_date);
    recurring::create_template(db, input, next_execution_date).await
}

/// Inserts a monthly template directly, skipping validation.
/// Use this to get rows into the table that the processor must reject.
pub async fn insert_raw_template(
    db: &DatabaseConnection,
    user_id: &str,
    title: &str,
    amount: f64,
    next_execution_date: NaiveDate,
) -> Result<recurring_transaction::Model> {
    let model = recurring_transaction::ActiveModel {
        user_id: Set(user_id.to_string()),
        title: Set(title.to_string()),
        amount: Set(amount),
        kind: Set(TransactionKind::Expense),
        category: Set("Housing".to_string()),
        account_id: Set(None),
        description: Set(None),
        tags: Set(None),
        frequency: Set(Frequency::Monthly),
        day_of_month: Set(None),
        next_execution_date: Set(next_execution_date),
        end_date: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Builds a ledger transaction input.
///
/// # Defaults
/// * `title`: `"Test transaction"`
/// * `kind`: expense
/// * `category`: "General"
/// * `transaction_date`: 2024-01-01
#[must_use]
pub fn new_test_transaction(user_id: &str, amount: f64) -> NewTransaction {
    NewTransaction {
        user_id: user_id.to_string(),
        title: "Test transaction".to_string(),
        amount,
        kind: TransactionKind::Expense,
        category: "General".to_string(),
        account_id: None,
        description: None,
        tags: None,
        transaction_date: reference_date(),
        recurring_transaction_id: None,
    }
}

/// Creates a closed long trade with the given strategy and realized PnL.
///
/// Exit price is derived from `pnl` with a quantity of 1.
pub async fn create_test_trade(
    db: &DatabaseConnection,
    user_id: &str,
    symbol: &str,
    strategy: Option<&str>,
    pnl: Option<f64>,
    traded_at: DateTime<Utc>,
) -> Result<trade::Model> {
    trades::create_trade(
        db,
        NewTrade {
            user_id: user_id.to_string(),
            symbol: symbol.to_string(),
            side: TradeSide::Long,
            strategy: strategy.map(str::to_string),
            entry_price: 100.0,
            exit_price: pnl.map(|pnl| 100.0 + pnl),
            quantity: 1.0,
            notes: None,
            traded_at,
        },
    )
    .await
}

/// Creates a post in `category` at `created_at`.
pub async fn create_test_post(
    db: &DatabaseConnection,
    category: &str,
    content: &str,
    created_at: DateTime<Utc>,
) -> Result<post::Model> {
    social::create_post_at(db, "test_user", category, content, created_at).await
}
