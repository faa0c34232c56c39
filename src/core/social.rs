//! Community features: posts, reactions, comments and trader rankings.
//!
//! These are plain rows with light validation. Trending scores are computed from
//! them in [`crate::core::trending`].

use crate::{
    entities::{
        Post, Profile, Reaction, ReactionKind, Trade, comment, post, profile, reaction, trade,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use serde::Serialize;
use std::collections::HashMap;

/// Creates a post timestamped now.
pub async fn create_post(
    db: &DatabaseConnection,
    user_id: &str,
    category: &str,
    content: &str,
) -> Result<post::Model> {
    create_post_at(db, user_id, category, content, Utc::now()).await
}

/// Creates a post with an explicit creation time.
pub async fn create_post_at(
    db: &DatabaseConnection,
    user_id: &str,
    category: &str,
    content: &str,
    created_at: DateTime<Utc>,
) -> Result<post::Model> {
    if content.trim().is_empty() {
        return Err(Error::validation("Post content cannot be empty"));
    }
    if category.trim().is_empty() {
        return Err(Error::validation("Post category cannot be empty"));
    }

    let model = post::ActiveModel {
        user_id: Set(user_id.to_string()),
        category: Set(category.trim().to_string()),
        content: Set(content.to_string()),
        created_at: Set(created_at),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

async fn ensure_post_exists(db: &DatabaseConnection, post_id: i64) -> Result<()> {
    Post::find_by_id(post_id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| Error::not_found("post", post_id))
}

/// Adds a reaction to a post.
///
/// A user holds at most one reaction of each kind per post; reacting twice returns
/// the existing row.
pub async fn add_reaction(
    db: &DatabaseConnection,
    post_id: i64,
    user_id: &str,
    kind: ReactionKind,
) -> Result<reaction::Model> {
    ensure_post_exists(db, post_id).await?;

    let existing = Reaction::find()
        .filter(reaction::Column::PostId.eq(post_id))
        .filter(reaction::Column::UserId.eq(user_id))
        .filter(reaction::Column::Kind.eq(kind))
        .one(db)
        .await?;
    if let Some(existing) = existing {
        return Ok(existing);
    }

    let model = reaction::ActiveModel {
        post_id: Set(post_id),
        user_id: Set(user_id.to_string()),
        kind: Set(kind),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Adds a comment to a post.
pub async fn add_comment(
    db: &DatabaseConnection,
    post_id: i64,
    user_id: &str,
    content: &str,
) -> Result<comment::Model> {
    if content.trim().is_empty() {
        return Err(Error::validation("Comment cannot be empty"));
    }
    ensure_post_exists(db, post_id).await?;

    let model = comment::ActiveModel {
        post_id: Set(post_id),
        user_id: Set(user_id.to_string()),
        content: Set(content.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Lists the most recent posts, newest first.
pub async fn list_recent_posts(db: &DatabaseConnection, limit: u64) -> Result<Vec<post::Model>> {
    Post::find()
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// One row of the trader leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraderRanking {
    /// 1-based position
    pub rank: usize,
    /// Trader
    pub user_id: String,
    /// Profile display name, or the user id without a profile
    pub display_name: String,
    /// Sum of realized PnL
    pub total_pnl: f64,
    /// Closed trades counted
    pub trade_count: usize,
    /// Share of closed trades with positive PnL, 0..=1
    pub win_rate: f64,
}

#[derive(Default)]
struct TraderTotals {
    total_pnl: f64,
    trades: usize,
    wins: usize,
}

/// Ranks users by realized PnL of trades opened since `since`.
///
/// Only closed trades (with a PnL) count. Ties are broken by trade count, then user id.
pub async fn trader_rankings(
    db: &DatabaseConnection,
    since: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<TraderRanking>> {
    let trades = Trade::find()
        .filter(trade::Column::TradedAt.gte(since))
        .filter(trade::Column::Pnl.is_not_null())
        .all(db)
        .await?;

    let mut totals: HashMap<String, TraderTotals> = HashMap::new();
    for closed in trades {
        let pnl = closed.pnl.unwrap_or_default();
        let entry = totals.entry(closed.user_id).or_default();
        entry.total_pnl += pnl;
        entry.trades += 1;
        if pnl > 0.0 {
            entry.wins += 1;
        }
    }

    let user_ids: Vec<String> = totals.keys().cloned().collect();
    let names: HashMap<String, String> = Profile::find()
        .filter(profile::Column::UserId.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.user_id, p.display_name))
        .collect();

    let mut ranked: Vec<(String, TraderTotals)> = totals.into_iter().collect();
    ranked.sort_by(|(a_id, a), (b_id, b)| {
        b.total_pnl
            .total_cmp(&a.total_pnl)
            .then_with(|| b.trades.cmp(&a.trades))
            .then_with(|| a_id.cmp(b_id))
    });

    Ok(ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (user_id, t))| {
            #[allow(clippy::cast_precision_loss)]
            let win_rate = if t.trades == 0 {
                0.0
            } else {
                t.wins as f64 / t.trades as f64
            };
            TraderRanking {
                rank: i + 1,
                display_name: names.get(&user_id).cloned().unwrap_or_else(|| user_id.clone()),
                user_id,
                total_pnl: t.total_pnl,
                trade_count: t.trades,
                win_rate,
            }
        })
        .collect())
}
