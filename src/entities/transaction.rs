//! Transaction entity - a single materialized ledger entry.
//!
//! Rows are either entered by the user or generated by the recurring processor,
//! in which case `recurring_transaction_id` points back at the template and
//! `transaction_date` is the execution date, not the day the processor ran.
use super::sea_orm_active_enums::TransactionKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the transaction
    pub user_id: String,
    /// Short human-readable title
    pub title: String,
    /// Positive monetary amount; direction comes from `kind`
    pub amount: f64,
    /// Income or expense
    pub kind: TransactionKind,
    /// Budget category
    pub category: String,
    /// Optional account reference
    pub account_id: Option<i64>,
    /// Optional description
    pub description: Option<String>,
    /// Optional tags as a JSON array
    pub tags: Option<Json>,
    /// Calendar date the money moved
    pub transaction_date: Date,
    /// Template that generated this row, if any
    pub recurring_transaction_id: Option<i64>,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Generated transactions belong to one recurring template
    #[sea_orm(
        belongs_to = "super::recurring_transaction::Entity",
        from = "Column::RecurringTransactionId",
        to = "super::recurring_transaction::Column::Id",
        on_delete = "SetNull"
    )]
    RecurringTransaction,
}

impl Related<super::recurring_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringTransaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
