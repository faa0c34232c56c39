//! String-backed enumerations shared by several entities.
//!
//! Each enum is stored as its lower-case name so rows stay readable from any
//! SQL client, and serializes the same way over the JSON API.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How often a recurring template produces a ledger transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every calendar day
    #[sea_orm(string_value = "daily")]
    Daily,
    /// Every seven days
    #[sea_orm(string_value = "weekly")]
    Weekly,
    /// Every calendar month, optionally anchored to a day of month
    #[sea_orm(string_value = "monthly")]
    Monthly,
    /// Every calendar year on the same month and day
    #[sea_orm(string_value = "yearly")]
    Yearly,
}

/// Direction of money for ledger rows and recurring templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in
    #[sea_orm(string_value = "income")]
    Income,
    /// Money going out
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// Subscription lifecycle of a user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Free trial still running (or not yet swept)
    #[sea_orm(string_value = "trial")]
    Trial,
    /// Paying subscriber
    #[sea_orm(string_value = "active")]
    Active,
    /// Trial ran out without a subscription
    #[sea_orm(string_value = "expired")]
    Expired,
}

/// Direction of a journaled trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    /// Bought first, profit when price rises
    #[sea_orm(string_value = "long")]
    Long,
    /// Sold first, profit when price falls
    #[sea_orm(string_value = "short")]
    Short,
}

/// Reaction a user can leave on a community post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    #[sea_orm(string_value = "like")]
    Like,
    #[sea_orm(string_value = "fire")]
    Fire,
    #[sea_orm(string_value = "insightful")]
    Insightful,
}
