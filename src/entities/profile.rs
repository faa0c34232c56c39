//! Profile entity - per-user subscription state.
//!
//! The primary key is the user id issued by the external auth provider.

use super::sea_orm_active_enums::SubscriptionStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    /// User id from the auth provider
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Name shown in rankings and on posts
    pub display_name: String,
    /// Trial, paying or expired
    pub subscription_status: SubscriptionStatus,
    /// Moment the free trial ends
    pub trial_ends_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
