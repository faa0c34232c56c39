//! Trade entity - one journaled trade.
//!
//! `pnl` is only set once the trade is closed (`exit_price` present).
//! `ai_tags` holds the labels returned by the AI classifier as a JSON array.

use super::sea_orm_active_enums::TradeSide;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Trade database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trades")]
pub struct Model {
    /// Unique identifier for the trade
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the journal entry
    pub user_id: String,
    /// Ticker symbol (e.g. "PETR4", "AAPL")
    pub symbol: String,
    /// Long or short
    pub side: TradeSide,
    /// Name of the strategy the user filed the trade under
    pub strategy: Option<String>,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub quantity: f64,
    /// Realized profit or loss, set when the trade is closed
    pub pnl: Option<f64>,
    pub notes: Option<String>,
    /// Labels assigned by the AI classifier, `None` until classified
    pub ai_tags: Option<Json>,
    /// When the trade was opened
    pub traded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
