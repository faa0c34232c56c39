//! Post entity - a community post.
//!
//! Hashtags are not stored separately; they are extracted from `content`
//! when trending topics are computed.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Post database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Author
    pub user_id: String,
    /// Topic category (e.g. "Options", "Crypto")
    pub category: String,
    /// Post body, may contain `#hashtags`
    pub content: String,
    pub created_at: DateTimeUtc,
}

/// Defines relationships between posts and their reactions and comments
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One post has many reactions
    #[sea_orm(has_many = "super::reaction::Entity")]
    Reactions,
    /// One post has many comments
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::reaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reactions.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
