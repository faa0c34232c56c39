//! Recurring transaction business logic
//!
//! Handles recurring templates and the scheduled processor that turns them into
//! ledger transactions. For every due template the processor, inside one database
//! transaction per template:
//!
//! 1. claims the `(template, execution date)` idempotency key in `recurring_executions`,
//! 2. inserts a ledger transaction dated on the template's next execution date,
//! 3. advances `next_execution_date` with a compare-and-set update,
//! 4. writes a notification for the owner.
//!
//! A failure anywhere rolls back only that template; the rest of the batch continues and
//! the failure is reported. A second run for the same date (repeated or concurrent) finds
//! the key already claimed and skips, so no ledger row is ever generated twice.

use crate::{
    core::{
        notification::{self, RECURRING_TRANSACTION_KIND},
        schedule,
        transaction::{self, NewTransaction, validate_amount},
    },
    entities::{
        Frequency, RecurringTransaction, TransactionKind, recurring_execution,
        recurring_transaction,
    },
    errors::{Error, Result},
    serde_helpers::{flexible_f64, flexible_tags},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    Condition, QueryOrder, Set, SqlErr, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// A template as submitted by a user or an import.
///
/// Field names follow the stored columns; `type` and `start_date` are accepted as
/// aliases because imported records use them.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateInput {
    /// Owner of the template
    pub user_id: String,
    /// Title copied onto generated rows
    pub title: String,
    /// Positive amount, a JSON number or numeric string
    #[serde(deserialize_with = "flexible_f64")]
    pub amount: f64,
    /// Income or expense
    #[serde(alias = "type")]
    pub kind: TransactionKind,
    /// Budget category
    pub category: String,
    /// Optional account reference
    #[serde(default)]
    pub account_id: Option<i64>,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Optional tags, an array or comma-separated string
    #[serde(default, deserialize_with = "flexible_tags")]
    pub tags: Option<Vec<String>>,
    /// Repetition period
    pub frequency: Frequency,
    /// Day-of-month anchor, only kept for monthly templates
    #[serde(default)]
    pub day_of_month: Option<i32>,
    /// First execution date; defaults to the day the template is created
    #[serde(default, alias = "start_date")]
    pub next_execution_date: Option<NaiveDate>,
    /// Optional last execution date
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Defaults to active
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// Editable fields of an existing template; `None` leaves a field unchanged.
///
/// `next_execution_date` is not editable: only the processor moves it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateUpdate {
    /// New title
    pub title: Option<String>,
    /// New amount
    pub amount: Option<f64>,
    /// New category
    pub category: Option<String>,
    /// New description
    pub description: Option<String>,
    /// Replacement tag list
    pub tags: Option<Vec<String>>,
    /// New frequency
    pub frequency: Option<Frequency>,
    /// New day-of-month anchor
    pub day_of_month: Option<i32>,
    /// New end date
    pub end_date: Option<NaiveDate>,
}

fn tags_to_json(tags: Option<Vec<String>>) -> Option<Json> {
    tags.filter(|list| !list.is_empty()).map(Json::from)
}

/// Anchors only make sense for monthly templates; other frequencies drop them.
fn effective_anchor(frequency: Frequency, day_of_month: Option<i32>) -> Result<Option<i32>> {
    match (frequency, day_of_month) {
        (Frequency::Monthly, Some(day)) => {
            schedule::validate_anchor(day)?;
            Ok(Some(day))
        }
        _ => Ok(None),
    }
}

/// Creates a template, validating amount, title, category, anchor and end date.
///
/// When no first execution date is given the template starts on `today`.
#[instrument(skip(db, input), fields(user_id = %input.user_id))]
pub async fn create_template(
    db: &DatabaseConnection,
    input: TemplateInput,
    today: NaiveDate,
) -> Result<recurring_transaction::Model> {
    validate_amount(input.amount)?;
    if input.title.trim().is_empty() {
        return Err(Error::validation("Template title cannot be empty"));
    }
    if input.category.trim().is_empty() {
        return Err(Error::validation("Template category cannot be empty"));
    }
    if input.user_id.trim().is_empty() {
        return Err(Error::validation("Template owner cannot be empty"));
    }

    let day_of_month = effective_anchor(input.frequency, input.day_of_month)?;
    let next_execution_date = input.next_execution_date.unwrap_or(today);
    if let Some(end) = input.end_date.filter(|end| *end < next_execution_date) {
        return Err(Error::validation(format!(
            "end_date {end} is before the first execution date {next_execution_date}"
        )));
    }

    let model = recurring_transaction::ActiveModel {
        user_id: Set(input.user_id),
        title: Set(input.title.trim().to_string()),
        amount: Set(input.amount),
        kind: Set(input.kind),
        category: Set(input.category),
        account_id: Set(input.account_id),
        description: Set(input.description),
        tags: Set(tags_to_json(input.tags)),
        frequency: Set(input.frequency),
        day_of_month: Set(day_of_month),
        next_execution_date: Set(next_execution_date),
        end_date: Set(input.end_date),
        is_active: Set(input.is_active),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    info!(template_id = created.id, "Recurring template created");
    Ok(created)
}

/// Confirms an imported template record.
///
/// The record is parsed leniently (see [`TemplateInput`]) and then stored exactly like a
/// template created by hand.
pub async fn import_template(
    db: &DatabaseConnection,
    record: Json,
    today: NaiveDate,
) -> Result<recurring_transaction::Model> {
    let input: TemplateInput = serde_json::from_value(record)?;
    create_template(db, input, today).await
}

/// Finds a template by its ID.
pub async fn get_template(
    db: &DatabaseConnection,
    template_id: i64,
) -> Result<Option<recurring_transaction::Model>> {
    RecurringTransaction::find_by_id(template_id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn get_owned_template(
    db: &DatabaseConnection,
    user_id: &str,
    template_id: i64,
) -> Result<recurring_transaction::Model> {
    RecurringTransaction::find_by_id(template_id)
        .filter(recurring_transaction::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("recurring transaction", template_id))
}

/// Lists a user's templates ordered by next execution date.
pub async fn list_templates_for_user(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<recurring_transaction::Model>> {
    RecurringTransaction::find()
        .filter(recurring_transaction::Column::UserId.eq(user_id))
        .order_by_asc(recurring_transaction::Column::NextExecutionDate)
        .order_by_asc(recurring_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a partial edit to one of the user's templates.
pub async fn update_template(
    db: &DatabaseConnection,
    user_id: &str,
    template_id: i64,
    update: TemplateUpdate,
) -> Result<recurring_transaction::Model> {
    let existing = get_owned_template(db, user_id, template_id).await?;
    let mut active: recurring_transaction::ActiveModel = existing.clone().into();

    if let Some(title) = update.title {
        if title.trim().is_empty() {
            return Err(Error::validation("Template title cannot be empty"));
        }
        active.title = Set(title.trim().to_string());
    }
    if let Some(amount) = update.amount {
        validate_amount(amount)?;
        active.amount = Set(amount);
    }
    if let Some(category) = update.category {
        if category.trim().is_empty() {
            return Err(Error::validation("Template category cannot be empty"));
        }
        active.category = Set(category);
    }
    if let Some(description) = update.description {
        active.description = Set(Some(description));
    }
    if let Some(tags) = update.tags {
        active.tags = Set(tags_to_json(Some(tags)));
    }

    let frequency = update.frequency.unwrap_or(existing.frequency);
    let anchor = update.day_of_month.or(existing.day_of_month);
    active.frequency = Set(frequency);
    active.day_of_month = Set(effective_anchor(frequency, anchor)?);

    if let Some(end) = update.end_date {
        if end < existing.next_execution_date {
            return Err(Error::validation(format!(
                "end_date {end} is before the next execution date {}",
                existing.next_execution_date
            )));
        }
        active.end_date = Set(Some(end));
    }

    active.update(db).await.map_err(Into::into)
}

/// Enables or disables one of the user's templates.
pub async fn set_template_active(
    db: &DatabaseConnection,
    user_id: &str,
    template_id: i64,
    is_active: bool,
) -> Result<recurring_transaction::Model> {
    let existing = get_owned_template(db, user_id, template_id).await?;
    let mut active: recurring_transaction::ActiveModel = existing.into();
    active.is_active = Set(is_active);
    active.update(db).await.map_err(Into::into)
}

/// Deletes one of the user's templates.
///
/// Ledger rows it generated stay in place with their template reference cleared.
pub async fn delete_template(db: &DatabaseConnection, user_id: &str, template_id: i64) -> Result<()> {
    let result = RecurringTransaction::delete_many()
        .filter(recurring_transaction::Column::Id.eq(template_id))
        .filter(recurring_transaction::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("recurring transaction", template_id));
    }
    Ok(())
}

/// Finds every template due on `today`: active, next execution on or before `today`
/// and not past its end date.
pub async fn find_due_templates<C>(
    db: &C,
    today: NaiveDate,
) -> Result<Vec<recurring_transaction::Model>>
where
    C: ConnectionTrait,
{
    use recurring_transaction::Column;

    RecurringTransaction::find()
        .filter(Column::IsActive.eq(true))
        .filter(Column::NextExecutionDate.lte(today))
        .filter(
            Condition::any()
                .add(Column::EndDate.is_null())
                .add(Expr::col(Column::EndDate).gte(Expr::col(Column::NextExecutionDate))),
        )
        .order_by_asc(Column::NextExecutionDate)
        .order_by_asc(Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// One ledger row produced by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedExecution {
    /// Template that was executed
    pub template_id: i64,
    /// New ledger row
    pub transaction_id: i64,
    /// Date written on the ledger row
    pub execution_date: NaiveDate,
    /// Template's next execution date after advancing
    pub next_execution_date: NaiveDate,
}

/// A template whose execution failed and was rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateFailure {
    /// Failed template
    pub template_id: i64,
    /// Its title, for the error report
    pub title: String,
    /// What went wrong
    pub message: String,
}

/// Outcome of a processor run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingReport {
    /// The "today" the run used
    pub run_date: Option<NaiveDate>,
    /// Number of due templates found
    pub processed: usize,
    /// Number of templates that generated a ledger row
    pub succeeded: usize,
    /// Templates already executed for this date by another run
    pub skipped: usize,
    /// Per-template failures
    pub failures: Vec<TemplateFailure>,
    /// Successfully generated rows
    pub generated: Vec<GeneratedExecution>,
}

enum ExecutionOutcome {
    Generated(GeneratedExecution),
    AlreadyExecuted,
}

fn notification_message(template: &recurring_transaction::Model) -> String {
    let direction = match template.kind {
        TransactionKind::Income => "Income",
        TransactionKind::Expense => "Expense",
    };
    format!(
        "{direction} of ${:.2} for \"{}\" was recorded for {}",
        template.amount,
        template.title,
        template.next_execution_date.format("%Y-%m-%d")
    )
}

async fn execute_template(
    db: &DatabaseConnection,
    template: &recurring_transaction::Model,
) -> Result<ExecutionOutcome> {
    let execution_date = template.next_execution_date;
    let next_date =
        schedule::next_execution_date(execution_date, template.frequency, template.day_of_month)?;

    // Dropping `txn` on any early return rolls the whole template back.
    let txn = db.begin().await?;

    let claim = recurring_execution::ActiveModel {
        recurring_transaction_id: Set(template.id),
        execution_date: Set(execution_date),
        execution_key: Set(recurring_execution::execution_key(template.id, execution_date)),
        executed_at: Set(Utc::now()),
        ..Default::default()
    };
    match claim.insert(&txn).await {
        Ok(_) => {}
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            txn.rollback().await?;
            return Ok(ExecutionOutcome::AlreadyExecuted);
        }
        Err(err) => return Err(err.into()),
    }

    let generated = transaction::create_transaction(
        &txn,
        NewTransaction {
            user_id: template.user_id.clone(),
            title: template.title.clone(),
            amount: template.amount,
            kind: template.kind,
            category: template.category.clone(),
            account_id: template.account_id,
            description: template.description.clone(),
            tags: template.tags.clone(),
            transaction_date: execution_date,
            recurring_transaction_id: Some(template.id),
        },
    )
    .await?;

    let advanced = RecurringTransaction::update_many()
        .col_expr(
            recurring_transaction::Column::NextExecutionDate,
            Expr::value(next_date),
        )
        .filter(recurring_transaction::Column::Id.eq(template.id))
        .filter(recurring_transaction::Column::NextExecutionDate.eq(execution_date))
        .exec(&txn)
        .await?;
    if advanced.rows_affected == 0 {
        // Someone else moved the date since we read the template
        txn.rollback().await?;
        return Ok(ExecutionOutcome::AlreadyExecuted);
    }

    notification::create_notification(
        &txn,
        &template.user_id,
        format!("Recurring transaction: {}", template.title),
        notification_message(template),
        RECURRING_TRANSACTION_KIND,
        Some(generated.id),
    )
    .await?;

    txn.commit().await?;

    Ok(ExecutionOutcome::Generated(GeneratedExecution {
        template_id: template.id,
        transaction_id: generated.id,
        execution_date,
        next_execution_date: next_date,
    }))
}

/// Processes every template due on `today`.
///
/// Templates are independent: each runs in its own database transaction and one
/// template's failure never stops the others. Each template executes at most once per
/// run, for its current next execution date.
///
/// # Errors
/// Only fails if the due templates cannot be loaded at all; per-template failures are
/// reported in [`ProcessingReport::failures`].
#[instrument(skip(db))]
pub async fn process_due_templates(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<ProcessingReport> {
    let due = find_due_templates(db, today).await?;
    let mut report = ProcessingReport {
        run_date: Some(today),
        processed: due.len(),
        ..Default::default()
    };

    for template in &due {
        match execute_template(db, template).await {
            Ok(ExecutionOutcome::Generated(generated)) => {
                report.succeeded += 1;
                report.generated.push(generated);
            }
            Ok(ExecutionOutcome::AlreadyExecuted) => {
                info!(
                    template_id = template.id,
                    date = %template.next_execution_date,
                    "Template already executed for this date, skipping"
                );
                report.skipped += 1;
            }
            Err(err) => {
                warn!(template_id = template.id, error = %err, "Recurring template failed");
                report.failures.push(TemplateFailure {
                    template_id: template.id,
                    title: template.title.clone(),
                    message: err.to_string(),
                });
            }
        }
    }

    info!(
        processed = report.processed,
        succeeded = report.succeeded,
        skipped = report.skipped,
        failed = report.failures.len(),
        "Recurring processor finished"
    );
    Ok(report)
}

/// Formats a processing report into a human-readable summary string.
#[must_use]
pub fn format_processing_summary(report: &ProcessingReport) -> String {
    use std::fmt::Write;

    let run_date = report
        .run_date
        .map_or_else(|| "unknown date".to_string(), |d| d.format("%Y-%m-%d").to_string());
    let mut summary = format!(
        "Recurring run {run_date} - {} due, {} generated, {} skipped, {} failed\n",
        report.processed,
        report.succeeded,
        report.skipped,
        report.failures.len()
    );

    for failure in &report.failures {
        // Writing to a String cannot fail
        let _ = writeln!(
            summary,
            "  #{} \"{}\": {}",
            failure.template_id, failure.title, failure.message
        );
    }

    summary
}
