//! Recurring transaction entity - a user-defined template for repeating income or expenses.
//!
//! The scheduled processor reads due templates, materializes one ledger `transaction`
//! per execution and advances `next_execution_date`. Templates are never deleted
//! by the processor; only the owner edits, toggles or removes them.

use super::sea_orm_active_enums::{Frequency, TransactionKind};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recurring template database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_transactions")]
pub struct Model {
    /// Unique identifier for the template
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the template
    pub user_id: String,
    /// Title copied onto every generated ledger row
    pub title: String,
    /// Positive monetary amount; direction comes from `kind`
    pub amount: f64,
    /// Income or expense
    pub kind: TransactionKind,
    /// Budget category (e.g. "Rent", "Salary")
    pub category: String,
    /// Optional account the money moves through
    pub account_id: Option<i64>,
    /// Optional free-form description
    pub description: Option<String>,
    /// Optional tags, stored as a JSON array of strings
    pub tags: Option<Json>,
    /// Repetition period
    pub frequency: Frequency,
    /// Day-of-month anchor for monthly templates (1..=31)
    pub day_of_month: Option<i32>,
    /// Date of the next execution; only ever moves forward
    pub next_execution_date: Date,
    /// Last date on which the template may still execute
    pub end_date: Option<Date>,
    /// Inactive templates are ignored by the processor
    pub is_active: bool,
    /// When the template was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between recurring templates and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One template generates many ledger transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// One template has one execution record per executed date
    #[sea_orm(has_many = "super::recurring_execution::Entity")]
    Executions,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::recurring_execution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Executions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
