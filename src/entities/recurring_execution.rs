//! Recurring execution entity - idempotency record for the recurring processor.
//!
//! One row per `(template, execution_date)`. The `execution_key` column is unique,
//! so a second processor run that tries to execute the same template for the same
//! date fails its claim and skips instead of inserting a duplicate ledger row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Execution record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_executions")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Template that was executed
    pub recurring_transaction_id: i64,
    /// The next-execution-date value that was consumed
    pub execution_date: Date,
    /// `"{template_id}:{YYYY-MM-DD}"`
    #[sea_orm(unique)]
    pub execution_key: String,
    /// When the execution was claimed
    pub executed_at: DateTimeUtc,
}

/// Defines relationships between executions and templates
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each execution belongs to one template
    #[sea_orm(
        belongs_to = "super::recurring_transaction::Entity",
        from = "Column::RecurringTransactionId",
        to = "super::recurring_transaction::Column::Id",
        on_delete = "Cascade"
    )]
    RecurringTransaction,
}

impl Related<super::recurring_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringTransaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Builds the idempotency key for a template and execution date.
#[must_use]
pub fn execution_key(template_id: i64, execution_date: Date) -> String {
    format!("{template_id}:{}", execution_date.format("%Y-%m-%d"))
}
