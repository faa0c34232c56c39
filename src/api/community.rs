use super::{
    AppState,
    response::{ApiResult, ok, query_params},
};
use crate::{
    core::{
        social::{self, TraderRanking},
        trending::{self, TrendingTopics},
    },
    errors::Error,
};
use axum::extract::{Query, State, rejection::QueryRejection};
use chrono::{Duration, Utc};
use serde::Deserialize;

const DEFAULT_RANKING_DAYS: i64 = 30;
const DEFAULT_RANKING_LIMIT: usize = 10;

pub(super) async fn trending(State(state): State<AppState>) -> ApiResult<TrendingTopics> {
    let settings = &state.config.trending;
    let topics =
        trending::trending_topics(&state.db, Utc::now(), settings.window_days, settings.limit)
            .await?;
    ok(topics)
}

#[derive(Debug, Deserialize)]
pub(super) struct RankingQuery {
    days: Option<i64>,
    limit: Option<usize>,
}

pub(super) async fn rankings(
    State(state): State<AppState>,
    query: Result<Query<RankingQuery>, QueryRejection>,
) -> ApiResult<Vec<TraderRanking>> {
    let query = query_params(query)?;
    let days = query.days.unwrap_or(DEFAULT_RANKING_DAYS);
    let limit = query.limit.unwrap_or(DEFAULT_RANKING_LIMIT);
    if !(1..=365).contains(&days) {
        return Err(Error::validation("days must be between 1 and 365"));
    }
    if !(1..=100).contains(&limit) {
        return Err(Error::validation("limit must be between 1 and 100"));
    }

    let since = Utc::now() - Duration::days(days);
    ok(social::trader_rankings(&state.db, since, limit).await?)
}
