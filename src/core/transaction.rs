//! Ledger transaction business logic.
//!
//! This module provides functions for creating, retrieving and deleting ledger rows and
//! for summarizing a user's month. Rows are immutable once written: corrections are made
//! by deleting and re-entering. Amounts are always positive; the `kind` column carries
//! the direction. Functions are generic over `ConnectionTrait` where the recurring
//! processor needs to call them inside its own database transaction.

use crate::{
    entities::{Transaction, TransactionKind, transaction},
    errors::{Error, Result},
};
use chrono::{Months, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};

/// Fields needed to create a ledger transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Owner of the row
    pub user_id: String,
    /// Short title
    pub title: String,
    /// Positive amount
    pub amount: f64,
    /// Income or expense
    pub kind: TransactionKind,
    /// Budget category
    pub category: String,
    /// Optional account reference
    #[serde(default)]
    pub account_id: Option<i64>,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Optional tags as a JSON array of strings
    #[serde(default)]
    pub tags: Option<Json>,
    /// Date the money moved
    pub transaction_date: NaiveDate,
    /// Template that produced the row, if generated
    #[serde(default)]
    pub recurring_transaction_id: Option<i64>,
}

/// Checks that an amount is a positive, finite number.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] otherwise.
pub fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Creates a ledger transaction after validating its title, category and amount.
///
/// Accepts any connection so the recurring processor can insert inside its per-template
/// database transaction.
pub async fn create_transaction<C>(db: &C, new: NewTransaction) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    validate_amount(new.amount)?;

    if new.title.trim().is_empty() {
        return Err(Error::validation("Transaction title cannot be empty"));
    }
    if new.category.trim().is_empty() {
        return Err(Error::validation("Transaction category cannot be empty"));
    }

    let model = transaction::ActiveModel {
        user_id: Set(new.user_id),
        title: Set(new.title.trim().to_string()),
        amount: Set(new.amount),
        kind: Set(new.kind),
        category: Set(new.category),
        account_id: Set(new.account_id),
        description: Set(new.description),
        tags: Set(new.tags),
        transaction_date: Set(new.transaction_date),
        recurring_transaction_id: Set(new.recurring_transaction_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Retrieves a specific transaction by its unique ID.
pub async fn get_transaction_by_id(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a user's transactions, newest transaction date first.
pub async fn list_transactions_for_user(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .order_by_desc(transaction::Column::TransactionDate)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every transaction generated by one recurring template, oldest first.
pub async fn list_transactions_for_template(
    db: &DatabaseConnection,
    template_id: i64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::RecurringTransactionId.eq(template_id))
        .order_by_asc(transaction::Column::TransactionDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes one of the user's transactions.
///
/// Only the owner may delete a row; a row owned by someone else is reported as not found.
pub async fn delete_transaction(
    db: &DatabaseConnection,
    user_id: &str,
    transaction_id: i64,
) -> Result<()> {
    let result = Transaction::delete_many()
        .filter(transaction::Column::Id.eq(transaction_id))
        .filter(transaction::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("transaction", transaction_id));
    }
    Ok(())
}

/// Income, expense and net totals for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlySummary {
    /// Sum of income rows
    pub income: f64,
    /// Sum of expense rows
    pub expense: f64,
    /// `income - expense`
    pub net: f64,
    /// Number of rows in the month
    pub count: usize,
}

/// Totals a set of transactions into a [`MonthlySummary`].
#[must_use]
pub fn summarize(transactions: &[transaction::Model]) -> MonthlySummary {
    let (income, expense) =
        transactions
            .iter()
            .fold((0.0, 0.0), |(income, expense), row| match row.kind {
                TransactionKind::Income => (income + row.amount, expense),
                TransactionKind::Expense => (income, expense + row.amount),
            });

    MonthlySummary {
        income,
        expense,
        net: income - expense,
        count: transactions.len(),
    }
}

/// Summarizes a user's ledger for one calendar month.
pub async fn summarize_month(
    db: &DatabaseConnection,
    user_id: &str,
    year: i32,
    month: u32,
) -> Result<MonthlySummary> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::validation(format!("invalid month {year}-{month:02}")))?;
    let end = start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| Error::DateOutOfRange {
            message: format!("month after {start}"),
        })?;

    let rows = Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::TransactionDate.gte(start))
        .filter(transaction::Column::TransactionDate.lt(end))
        .all(db)
        .await?;

    Ok(summarize(&rows))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_transaction_validation() -> Result<()> {
        let db = setup_test_db().await?;

        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let mut new = new_test_transaction("user1", amount);
            new.title = "valid".to_string();
            let result = create_transaction(&db, new).await;
            assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        }

        let mut new = new_test_transaction("user1", 10.0);
        new.title = "   ".to_string();
        let result = create_transaction(&db, new).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let mut new = new_test_transaction("user1", 10.0);
        new.category = String::new();
        let result = create_transaction(&db, new).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        // rejected input never reaches the table
        assert_eq!(Transaction::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_list_transactions() -> Result<()> {
        let db = setup_test_db().await?;

        let mut older = new_test_transaction("user1", 25.0);
        older.transaction_date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let mut newer = new_test_transaction("user1", 40.0);
        newer.transaction_date = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
        create_transaction(&db, older).await?;
        let created = create_transaction(&db, newer).await?;
        create_transaction(&db, new_test_transaction("someone_else", 1.0)).await?;

        let rows = list_transactions_for_user(&db, "user1").await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, created.id);
        assert_eq!(rows[0].amount, 40.0);

        let fetched = get_transaction_by_id(&db, created.id).await?.unwrap();
        assert_eq!(fetched.title, "Test transaction");

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_transaction_checks_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let row = create_transaction(&db, new_test_transaction("user1", 10.0)).await?;

        let result = delete_transaction(&db, "intruder", row.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        delete_transaction(&db, "user1", row.id).await?;
        assert!(get_transaction_by_id(&db, row.id).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_summarize_month() -> Result<()> {
        let db = setup_test_db().await?;

        let mut salary = new_test_transaction("user1", 3000.0);
        salary.kind = TransactionKind::Income;
        salary.transaction_date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut rent = new_test_transaction("user1", 1200.0);
        rent.transaction_date = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let mut april = new_test_transaction("user1", 99.0);
        april.transaction_date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

        create_transaction(&db, salary).await?;
        create_transaction(&db, rent).await?;
        create_transaction(&db, april).await?;

        let summary = summarize_month(&db, "user1", 2024, 3).await?;
        assert_eq!(summary.count, 2);
        assert_eq!(summary.income, 3000.0);
        assert_eq!(summary.expense, 1200.0);
        assert_eq!(summary.net, 1800.0);

        assert!(summarize_month(&db, "user1", 2024, 13).await.is_err());
        Ok(())
    }
}
