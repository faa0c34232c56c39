//! Trade journal business logic.
//!
//! Besides plain creation and listing this module owns two bulk operations exposed
//! as request handlers: deleting every trade filed under a strategy, and classifying
//! unlabeled trades through an AI service. Classification is a serial loop with a
//! fixed pause between requests; a trade that fails is recorded and skipped.

use crate::{
    entities::{Trade, TradeSide, trade},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Fields needed to journal a trade.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTrade {
    /// Owner
    pub user_id: String,
    /// Ticker symbol
    pub symbol: String,
    /// Long or short
    pub side: TradeSide,
    /// Strategy name the trade is filed under
    #[serde(default)]
    pub strategy: Option<String>,
    /// Entry price per unit
    pub entry_price: f64,
    /// Exit price per unit, if closed
    #[serde(default)]
    pub exit_price: Option<f64>,
    /// Units traded
    pub quantity: f64,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
    /// When the trade was opened
    pub traded_at: DateTime<Utc>,
}

/// Realized profit or loss of a closed trade.
#[must_use]
pub fn realized_pnl(side: TradeSide, entry: f64, exit: f64, quantity: f64) -> f64 {
    match side {
        TradeSide::Long => (exit - entry) * quantity,
        TradeSide::Short => (entry - exit) * quantity,
    }
}

fn validate_price(value: f64, field: &str) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::validation(format!("{field} must be a positive number")));
    }
    Ok(())
}

/// Journals a trade, computing its PnL when an exit price is given.
pub async fn create_trade(db: &DatabaseConnection, new: NewTrade) -> Result<trade::Model> {
    let symbol = new.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(Error::validation("Trade symbol cannot be empty"));
    }
    validate_price(new.entry_price, "entry_price")?;
    validate_price(new.quantity, "quantity")?;
    if let Some(exit) = new.exit_price {
        validate_price(exit, "exit_price")?;
    }

    let pnl = new
        .exit_price
        .map(|exit| realized_pnl(new.side, new.entry_price, exit, new.quantity));
    let strategy = new
        .strategy
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let model = trade::ActiveModel {
        user_id: Set(new.user_id),
        symbol: Set(symbol),
        side: Set(new.side),
        strategy: Set(strategy),
        entry_price: Set(new.entry_price),
        exit_price: Set(new.exit_price),
        quantity: Set(new.quantity),
        pnl: Set(pnl),
        notes: Set(new.notes),
        ai_tags: Set(None),
        traded_at: Set(new.traded_at),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Lists a user's trades, most recent first.
pub async fn list_trades(db: &DatabaseConnection, user_id: &str) -> Result<Vec<trade::Model>> {
    Trade::find()
        .filter(trade::Column::UserId.eq(user_id))
        .order_by_desc(trade::Column::TradedAt)
        .order_by_desc(trade::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes every trade the user filed under `strategy`. Returns the number deleted.
#[instrument(skip(db))]
pub async fn delete_trades_by_strategy(
    db: &DatabaseConnection,
    user_id: &str,
    strategy: &str,
) -> Result<u64> {
    let strategy = strategy.trim();
    if strategy.is_empty() {
        return Err(Error::validation("strategy cannot be empty"));
    }
    if user_id.trim().is_empty() {
        return Err(Error::validation("user_id cannot be empty"));
    }

    let result = Trade::delete_many()
        .filter(trade::Column::UserId.eq(user_id))
        .filter(trade::Column::Strategy.eq(strategy))
        .exec(db)
        .await?;

    info!(deleted = result.rows_affected, "Deleted trades by strategy");
    Ok(result.rows_affected)
}

/// Something that can label a trade, typically an AI chat-completion service.
pub trait TradeClassifier {
    /// Returns the labels for `trade`.
    fn classify(&self, trade: &trade::Model) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// A trade whose classification failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeFailure {
    /// Trade that was skipped
    pub trade_id: i64,
    /// What went wrong
    pub message: String,
}

/// Outcome of a bulk classification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationReport {
    /// Unclassified trades found
    pub total: usize,
    /// Trades labeled and saved
    pub classified: usize,
    /// Trades that failed
    pub failed: usize,
    /// Failure details
    pub failures: Vec<TradeFailure>,
}

/// Classifies every unlabeled trade of `user_id`, oldest first.
///
/// Requests are sent one at a time with `delay` between them so the downstream API is
/// not flooded. Failures do not stop the loop.
#[instrument(skip(db, classifier))]
pub async fn classify_trades<T>(
    db: &DatabaseConnection,
    classifier: &T,
    user_id: &str,
    delay: Duration,
) -> Result<ClassificationReport>
where
    T: TradeClassifier + Sync,
{
    let pending = Trade::find()
        .filter(trade::Column::UserId.eq(user_id))
        .filter(trade::Column::AiTags.is_null())
        .order_by_asc(trade::Column::TradedAt)
        .order_by_asc(trade::Column::Id)
        .all(db)
        .await?;

    let mut report = ClassificationReport {
        total: pending.len(),
        ..Default::default()
    };

    for (i, pending_trade) in pending.into_iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let trade_id = pending_trade.id;
        let outcome = match classifier.classify(&pending_trade).await {
            Ok(labels) => {
                let mut active: trade::ActiveModel = pending_trade.into();
                active.ai_tags = Set(Some(Json::from(labels)));
                active.update(db).await.map(|_| ()).map_err(Error::from)
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => report.classified += 1,
            Err(err) => {
                warn!(trade_id, error = %err, "Trade classification failed");
                report.failed += 1;
                report.failures.push(TradeFailure {
                    trade_id,
                    message: err.to_string(),
                });
            }
        }
    }

    info!(
        classified = report.classified,
        failed = report.failed,
        "Trade classification finished"
    );
    Ok(report)
}
