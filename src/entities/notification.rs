//! Notification entity - in-app messages shown to a user.
//!
//! The recurring processor writes one per generated ledger transaction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Recipient
    pub user_id: String,
    pub title: String,
    pub message: String,
    /// Free-form category such as `"recurring_transaction"`
    pub kind: String,
    /// Id of the row the notification is about, if any
    pub reference_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
